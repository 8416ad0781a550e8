//! Canonical query and body encoding
//!
//! The strings produced here are both signed and sent, so they are computed
//! exactly once per request.

use kraken_types::QueryValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ProxyError, ProxyResult};

/// Encode query parameters as `application/x-www-form-urlencoded`
///
/// List values repeat the key once per element, in element order:
/// `{"pair": ["A", "B"]}` becomes `pair=A&pair=B`.
pub fn encode_query(query: &BTreeMap<String, QueryValue>) -> ProxyResult<String> {
    let pairs: Vec<(&str, String)> = query
        .iter()
        .flat_map(|(key, value)| {
            value
                .values()
                .iter()
                .map(move |scalar| (key.as_str(), scalar.to_string()))
        })
        .collect();

    serde_urlencoded::to_string(&pairs).map_err(|e| ProxyError::Encode(e.to_string()))
}

/// Encode the body as compact JSON, or `None` when there is nothing to send
pub fn encode_body(body: &Map<String, Value>) -> ProxyResult<Option<String>> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(body)
        .map(Some)
        .map_err(|e| ProxyError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_types::Scalar;
    use serde_json::json;

    fn query(entries: Vec<(&str, QueryValue)>) -> BTreeMap<String, QueryValue> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(encode_query(&BTreeMap::new()).unwrap(), "");
    }

    #[test]
    fn test_comma_is_percent_encoded() {
        let q = query(vec![("pair", QueryValue::from("XXBTZUSD,XETHZUSD"))]);
        assert_eq!(encode_query(&q).unwrap(), "pair=XXBTZUSD%2CXETHZUSD");
    }

    #[test]
    fn test_list_repeats_key_in_order() {
        let q = query(vec![("pair", QueryValue::from(vec!["ZETA", "ALPHA", "MID"]))]);
        assert_eq!(encode_query(&q).unwrap(), "pair=ZETA&pair=ALPHA&pair=MID");
    }

    #[test]
    fn test_list_and_scalar_mix() {
        let q = query(vec![
            ("interval", QueryValue::from(60u32)),
            ("asset", QueryValue::from(vec!["XBT", "ETH"])),
            ("trades", QueryValue::from(true)),
        ]);
        assert_eq!(
            encode_query(&q).unwrap(),
            "asset=XBT&asset=ETH&interval=60&trades=true"
        );
    }

    #[test]
    fn test_empty_list_contributes_nothing() {
        let q = query(vec![("pair", QueryValue::Many(vec![]))]);
        assert_eq!(encode_query(&q).unwrap(), "");
    }

    #[test]
    fn test_form_encoding_rules() {
        let q = query(vec![
            ("q", QueryValue::from("a b&c=d/é")),
            ("safe", QueryValue::from("A-z_0.9*")),
        ]);
        assert_eq!(
            encode_query(&q).unwrap(),
            "q=a+b%26c%3Dd%2F%C3%A9&safe=A-z_0.9*"
        );
    }

    #[test]
    fn test_scalar_texts() {
        let q = query(vec![
            ("f", QueryValue::from(1.5)),
            ("n", QueryValue::One(Scalar::Null)),
            ("neg", QueryValue::from(-2i64)),
        ]);
        assert_eq!(encode_query(&q).unwrap(), "f=1.5&n=null&neg=-2");
    }

    #[test]
    fn test_integral_float_drops_fraction() {
        let request = kraken_types::ProxyRequest::from_json(
            br#"{"path":"/0/public/Trades","query":{"since":1.0,"step":0.5}}"#,
        )
        .unwrap();
        assert_eq!(encode_query(&request.query).unwrap(), "since=1&step=0.5");
    }

    #[test]
    fn test_empty_body_is_none() {
        assert_eq!(encode_body(&Map::new()).unwrap(), None);
    }

    #[test]
    fn test_body_is_compact_json() {
        let body = json!({"nonce": "1616492376594", "pair": "XBTUSD", "volume": 1.25});
        let text = encode_body(body.as_object().unwrap()).unwrap().unwrap();
        assert_eq!(text, r#"{"nonce":"1616492376594","pair":"XBTUSD","volume":1.25}"#);
    }
}
