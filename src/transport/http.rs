use std::io::Read;

use flate2::read::GzDecoder;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};

use super::{Method, Request, Transport};
use crate::config::ConnectionConfig;
use crate::error::{LayerError, LayerResult};

/// Blocking HTTP transport backed by reqwest.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ConnectionConfig) -> LayerResult<Self> {
        let mut builder = Client::builder().user_agent("maplayer");
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(map_reqwest_error)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> LayerResult<String> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        if let Some(params) = &request.params {
            builder = match request.method {
                Method::Get => builder.query(params),
                Method::Post => builder.form(params),
            };
        }
        if request.use_gzip {
            builder = builder.header(ACCEPT_ENCODING, "gzip");
        }
        let response = builder.send().map_err(map_reqwest_error)?;
        handle_response(response)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LayerError {
    if err.is_timeout() {
        return LayerError::Transport(format!("request timed out: {err}"));
    }
    if err.is_connect() {
        return LayerError::Transport(format!("failed to connect: {err}"));
    }
    LayerError::Transport(err.to_string())
}

fn handle_response(response: Response) -> LayerResult<String> {
    let status = response.status();
    let gzipped = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("gzip"))
        .unwrap_or(false);
    let bytes = response.bytes().map_err(map_reqwest_error)?;
    let body = if gzipped {
        let mut body = String::new();
        GzDecoder::new(&bytes[..])
            .read_to_string(&mut body)
            .map_err(|err| LayerError::Transport(format!("could not inflate response: {err}")))?;
        body
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|err| LayerError::Transport(format!("response is not UTF-8: {err}")))?
    };

    if !status.is_success() {
        return Err(remote_error(status.as_u16(), &body));
    }
    Ok(body)
}

/// Build a remote error from a failed response, preferring the code and message the server put
/// in its JSON error body over the bare HTTP status.
fn remote_error(status: u16, body: &str) -> LayerError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |names: &[&str]| {
        parsed
            .as_ref()
            .and_then(|value| names.iter().find_map(|name| value.get(*name)).cloned())
    };
    let code = field(&["errCode", "code"])
        .and_then(|code| code.as_i64())
        .unwrap_or(status as i64);
    let message = field(&["error", "message", "errMsg"])
        .and_then(|message| message.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP status {status}")
            } else {
                body.trim().to_string()
            }
        });
    LayerError::Remote { code, message }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::panic::{self, AssertUnwindSafe};

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use httpmock::prelude::*;
    use rstest::rstest;
    use url::Url;

    use super::*;
    use crate::error::ErrorCode;
    use crate::transport::FormParams;

    fn try_start_server() -> Option<MockServer> {
        panic::catch_unwind(AssertUnwindSafe(|| MockServer::start())).ok()
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(&ConnectionConfig::new("http://localhost/").unwrap()).unwrap()
    }

    #[rstest]
    fn test_post_sends_form_params() {
        let Some(server) = try_start_server() else {
            eprintln!("Skipping test_post_sends_form_params: unable to start mock server");
            return;
        };
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/layers/roads/data")
                .query_param("op", "remove")
                .x_www_form_urlencoded_tuple("condition", "status='closed'");
            then.status(200).body("");
        });

        let url = Url::parse(&server.url("/layers/roads/data?op=remove")).unwrap();
        let params = FormParams::from([("condition".to_string(), "status='closed'".to_string())]);
        let body = transport()
            .execute(&Request::post(url, Some(params), false))
            .unwrap();

        mock.assert();
        assert_eq!(body, "");
    }

    #[rstest]
    fn test_gzip_response_is_inflated() {
        let Some(server) = try_start_server() else {
            eprintln!("Skipping test_gzip_response_is_inflated: unable to start mock server");
            return;
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"42").unwrap();
        let compressed = encoder.finish().unwrap();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/layers/roads/data")
                .header("accept-encoding", "gzip");
            then.status(200)
                .header("content-encoding", "gzip")
                .body(compressed);
        });

        let url = Url::parse(&server.url("/layers/roads/data?op=count")).unwrap();
        let body = transport()
            .execute(&Request::post(url, Some(FormParams::new()), true))
            .unwrap();

        mock.assert();
        assert_eq!(body, "42");
    }

    #[rstest]
    fn test_invalid_utf8_body_is_a_transport_error() {
        let Some(server) = try_start_server() else {
            eprintln!("Skipping test_invalid_utf8_body_is_a_transport_error: unable to start mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(POST).path("/layers/roads/data");
            then.status(200).body([0xff_u8, 0xfe]);
        });

        let url = Url::parse(&server.url("/layers/roads/data?op=query")).unwrap();
        let err = transport()
            .execute(&Request::post(url, Some(FormParams::new()), false))
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::TransportFailure);
    }

    #[rstest]
    fn test_error_body_becomes_remote_error() {
        let Some(server) = try_start_server() else {
            eprintln!("Skipping test_error_body_becomes_remote_error: unable to start mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(POST).path("/layers/roads/fields/name");
            then.status(500)
                .body(r#"{"errCode": -3, "error": "column is in use"}"#);
        });

        let url = Url::parse(&server.url("/layers/roads/fields/name?op=remove")).unwrap();
        let err = transport()
            .execute(&Request::post(url, None, false))
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::RemoteFailure);
        match err {
            LayerError::Remote { code, message } => {
                assert_eq!(code, -3);
                assert_eq!(message, "column is in use");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[rstest]
    #[case(404, "", 404, "HTTP status 404")]
    #[case(503, "maintenance", 503, "maintenance")]
    #[case(400, r#"{"code": 12, "message": "bad filter"}"#, 12, "bad filter")]
    fn test_remote_error_fallbacks(
        #[case] status: u16,
        #[case] body: &str,
        #[case] expected_code: i64,
        #[case] expected_message: &str,
    ) {
        match remote_error(status, body) {
            LayerError::Remote { code, message } => {
                assert_eq!(code, expected_code);
                assert_eq!(message, expected_message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
