//! Test-result lookup request shared by real and decoy traffic.
//!
//! Every lookup body is padded to the same serialized size and carries the
//! `cwa-fake` header, so real lookups and decoys look identical on the wire.

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use exposure_core::PipelineError;

/// Serialized size of every lookup body in bytes.
pub const LOOKUP_BODY_SIZE: usize = 1000;

/// Header telling the server whether to process the request.
pub const FAKE_HEADER: &str = "cwa-fake";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestResultRequest<'a> {
    registration_token: &'a str,
    request_padding: String,
}

/// Path of the lookup endpoint under `base_url`.
pub fn lookup_endpoint(base_url: &str) -> String {
    format!("{}/version/v1/testresult", base_url.trim_end_matches('/'))
}

/// JSON body for `token`, padded to [`LOOKUP_BODY_SIZE`].
pub fn padded_body(token: &str) -> Result<Vec<u8>, PipelineError> {
    let encode = |request: &TestResultRequest<'_>| {
        serde_json::to_vec(request).map_err(|e| PipelineError::UnexpectedClient(e.to_string()))
    };

    let unpadded = encode(&TestResultRequest {
        registration_token: token,
        request_padding: String::new(),
    })?;

    // Alphanumeric padding needs no JSON escaping, so it adds exactly its length.
    let padding_len = LOOKUP_BODY_SIZE.saturating_sub(unpadded.len());
    let request_padding = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(padding_len)
        .map(char::from)
        .collect();

    encode(&TestResultRequest {
        registration_token: token,
        request_padding,
    })
}

/// Build a lookup request. `fake` only changes the header value.
pub fn lookup_request(
    client: &reqwest::Client,
    endpoint: &str,
    token: &str,
    fake: bool,
) -> Result<reqwest::RequestBuilder, PipelineError> {
    let body = padded_body(token)?;
    Ok(client
        .post(endpoint)
        .header(FAKE_HEADER, if fake { "1" } else { "0" })
        .header(CONTENT_TYPE, "application/json")
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_core::RegistrationToken;

    fn built(token: &str, fake: bool) -> reqwest::Request {
        lookup_request(
            &reqwest::Client::new(),
            &lookup_endpoint("http://localhost:1"),
            token,
            fake,
        )
        .unwrap()
        .build()
        .unwrap()
    }

    fn body_len(request: &reqwest::Request) -> usize {
        request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| b.len())
            .unwrap()
    }

    #[test]
    fn test_real_and_decoy_requests_have_same_size() {
        let real = built("short-token", false);
        let decoy = built(RegistrationToken::generate().as_str(), true);

        assert_eq!(body_len(&real), LOOKUP_BODY_SIZE);
        assert_eq!(body_len(&decoy), LOOKUP_BODY_SIZE);
        assert_eq!(real.url(), decoy.url());
        assert_eq!(real.headers().len(), decoy.headers().len());

        let real_flag = real.headers().get(FAKE_HEADER).unwrap();
        let decoy_flag = decoy.headers().get(FAKE_HEADER).unwrap();
        assert_eq!(real_flag, "0");
        assert_eq!(decoy_flag, "1");
        assert_eq!(real_flag.len(), decoy_flag.len());
    }

    #[test]
    fn test_body_carries_token_and_padding() {
        let body = padded_body("tok").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["registrationToken"], "tok");
        assert!(!json["requestPadding"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_endpoint_has_no_double_slash() {
        assert_eq!(
            lookup_endpoint("http://localhost:1/"),
            "http://localhost:1/version/v1/testresult"
        );
    }
}
