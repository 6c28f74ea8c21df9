//! Complex-action page URLs.
//!
//! Drilling into an action opens the complex-action page in a new tab. The
//! action travels in the query string (`actId`, `actLstId`, `actDetId`,
//! `actTyp`, `medTyp`) and the page reads it back on load.

use crate::api::Endpoint;
use crate::decode::decode_response;
use crate::error::ApiError;
use cab_core::{ComplexActionQuery, Scalar};
use serde::Deserialize;
use url::Url;

const ACT_ID: &str = "actId";
const ACT_LIST_ID: &str = "actLstId";
const ACT_DETAIL_ID: &str = "actDetId";
const ACT_TYPE: &str = "actTyp";
const MEDIA_TYPE: &str = "medTyp";

#[derive(Deserialize)]
struct NewTab {
    new_tab: String,
}

/// Page path from a `loadcplxaction` response body.
pub fn decode_new_tab(body: &str) -> Result<String, ApiError> {
    let page: NewTab = decode_response(Endpoint::LoadComplexAction.operation(), body)?;
    Ok(page.new_tab)
}

/// Resolve `new_tab` against `base` and append the action parameters.
pub fn complex_action_page_url(
    base: &Url,
    new_tab: &str,
    query: &ComplexActionQuery,
) -> Result<Url, ApiError> {
    let mut url = base.join(new_tab)?;
    let text = |v: &Option<Scalar>| v.as_ref().map(ToString::to_string).unwrap_or_default();
    url.query_pairs_mut()
        .clear()
        .append_pair(ACT_ID, &text(&query.action_id))
        .append_pair(ACT_LIST_ID, &text(&query.action_list_id))
        .append_pair(ACT_DETAIL_ID, &text(&query.action_detail_id))
        .append_pair(ACT_TYPE, query.action_type.as_deref().unwrap_or_default())
        .append_pair(MEDIA_TYPE, query.media_type.as_deref().unwrap_or_default());
    Ok(url)
}

/// Read the action parameters from a page URL. Missing or empty values are `None`.
pub fn parse_page_query(url: &Url) -> ComplexActionQuery {
    let mut query = ComplexActionQuery::default();
    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            ACT_ID => query.action_id = Some(scalar(&value)),
            ACT_LIST_ID => query.action_list_id = Some(scalar(&value)),
            ACT_DETAIL_ID => query.action_detail_id = Some(scalar(&value)),
            ACT_TYPE => query.action_type = Some(value.into_owned()),
            MEDIA_TYPE => query.media_type = Some(value.into_owned()),
            _ => {}
        }
    }
    query
}

fn scalar(text: &str) -> Scalar {
    text.parse::<i64>()
        .map_or_else(|_| Scalar::Text(text.to_string()), Scalar::Int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query() -> ComplexActionQuery {
        ComplexActionQuery {
            action_id: Some(Scalar::Int(11)),
            action_list_id: Some(Scalar::Int(900)),
            action_detail_id: Some(Scalar::Int(111)),
            action_type: Some("CAStatic".into()),
            media_type: Some("TFT 16:9".into()),
        }
    }

    #[test]
    fn builds_page_url() {
        let base = Url::parse("http://127.0.0.1:8000/").unwrap();
        let url = complex_action_page_url(&base, "/cab/cplxaction", &query()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/cab/cplxaction?actId=11&actLstId=900&actDetId=111&actTyp=CAStatic&medTyp=TFT+16%3A9"
        );
    }

    #[test]
    fn page_url_reads_back() {
        let base = Url::parse("http://cab.local/").unwrap();
        let url = complex_action_page_url(&base, "/cab/cplxaction", &query()).unwrap();
        assert_eq!(parse_page_query(&url), query());
    }

    #[test]
    fn new_tab_comes_from_the_double_encoded_body() {
        let body = crate::encode_response(&serde_json::json!({ "new_tab": "/cab/cplxaction" }));
        assert_eq!(decode_new_tab(&body).unwrap(), "/cab/cplxaction");

        let err = decode_new_tab(r#""{}""#).unwrap_err();
        assert!(matches!(err, ApiError::Decode { operation: "loadCplxAction", .. }));
    }

    #[test]
    fn missing_values_are_none() {
        let url = Url::parse("http://cab.local/cab/cplxaction?actId=abc&medTyp=&other=1").unwrap();
        let parsed = parse_page_query(&url);
        assert_eq!(parsed.action_id, Some(Scalar::Text("abc".into())));
        assert_eq!(parsed.media_type, None);
        assert_eq!(parsed.action_list_id, None);
    }
}
