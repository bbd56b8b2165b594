// Request identifier normalization.
// Turns an endpoint URL and its query parameters into a canonical cache key.

use std::fmt;

/// Separator between the URL and the flattened parameters.
pub const QUERY_SEPARATOR: char = '?';
/// Separator between flattened keys and values.
pub const PARAM_DELIMITER: &str = "_";

/// A scalar query parameter value.
///
/// Only scalars take part in cache keys; structured values have no stable
/// rendering and are not accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Ordered list of query parameters for a request.
pub type Params = Vec<(String, ParamValue)>;

/// Build a parameter list from `(key, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Render parameters as the string pairs sent on the wire.
pub fn query_pairs(params: &[(String, ParamValue)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

/// Canonical, case-insensitive identifier for `url` queried with `params`.
///
/// Parameters are stable-sorted by key and flattened to
/// `k1_v1_k2_v2...`, appended to the URL after `?`, then uppercased:
/// `normalize("http://api/x", [b=2, a=1])` is `HTTP://API/X?A_1_B_2`.
pub fn normalize(url: &str, params: &[(String, ParamValue)]) -> String {
    let mut sorted: Vec<&(String, ParamValue)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let flattened = sorted
        .iter()
        .flat_map(|(key, value)| [key.clone(), value.to_string()])
        .collect::<Vec<_>>()
        .join(PARAM_DELIMITER);

    format!("{}{}{}", url, QUERY_SEPARATOR, flattened).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical_form() {
        let p = params([("b", 2i64), ("a", 1i64)]);
        assert_eq!(normalize("http://api/x", &p), "HTTP://API/X?A_1_B_2");
    }

    #[test]
    fn test_normalize_ignores_insertion_order() {
        let url = "https://api.tumblr.com/v2/blog/nbcnews.tumblr.com/posts/";
        let forward: Params = vec![
            ("type".into(), "text".into()),
            ("limit".into(), 20u32.into()),
            ("filter".into(), "text".into()),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let rotated = vec![forward[1].clone(), forward[2].clone(), forward[0].clone()];

        let expected =
            "HTTPS://API.TUMBLR.COM/V2/BLOG/NBCNEWS.TUMBLR.COM/POSTS/?FILTER_TEXT_LIMIT_20_TYPE_TEXT";
        assert_eq!(normalize(url, &forward), expected);
        assert_eq!(normalize(url, &reversed), expected);
        assert_eq!(normalize(url, &rotated), expected);
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        let lower = params([("type", "photo")]);
        let upper = params([("TYPE", "PHOTO")]);
        assert_eq!(
            normalize("http://api/x", &lower),
            normalize("HTTP://API/X", &upper)
        );
    }

    #[test]
    fn test_normalize_without_params() {
        assert_eq!(normalize("http://api/x", &[]), "HTTP://API/X?");
    }

    #[test]
    fn test_query_pairs_keep_order_and_case() {
        let p = params([("type", ParamValue::from("Photo")), ("limit", ParamValue::from(20u32))]);
        assert_eq!(
            query_pairs(&p),
            vec![
                ("type".to_string(), "Photo".to_string()),
                ("limit".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_scalar_rendering() {
        let p = params([("flag", ParamValue::Bool(true)), ("ratio", ParamValue::Float(0.5))]);
        assert_eq!(normalize("u", &p), "U?FLAG_TRUE_RATIO_0.5");
    }
}
