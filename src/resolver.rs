use crate::str_utils::non_empty;
use crate::types::CandidateAddress;

/// Ordered, duplicate-free candidate list: the configured address first, then
/// the fallback table in order. Pure; called fresh for every logical request.
pub fn resolve_candidates(configured: Option<&str>, fallbacks: &[String]) -> Vec<CandidateAddress> {
    let mut candidates: Vec<CandidateAddress> = Vec::with_capacity(fallbacks.len() + 1);

    let configured = non_empty(configured);
    let fallbacks = fallbacks.iter().filter_map(|f| non_empty(Some(f.as_str())));

    for address in configured.into_iter().chain(fallbacks) {
        if !candidates.iter().any(|c| c.as_str() == address) {
            candidates.push(CandidateAddress(address));
        }
    }

    candidates
}

/// The built-in fallback table as owned strings.
pub fn default_fallbacks() -> Vec<String> {
    crate::constants::DEFAULT_FALLBACK_BACKENDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[CandidateAddress]) -> Vec<&str> {
        list.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn no_configured_address_yields_fixed_table() {
        let list = resolve_candidates(None, &default_fallbacks());
        assert_eq!(
            addrs(&list),
            vec![
                "http://127.0.0.1:8000",
                "http://localhost:8000",
                "http://host.docker.internal:8000",
                "http://backend:8000",
            ]
        );
    }

    #[test]
    fn configured_address_goes_first() {
        let list = resolve_candidates(Some(" http://api.internal:9000 "), &default_fallbacks());
        assert_eq!(list[0].as_str(), "http://api.internal:9000");
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn configured_duplicate_keeps_priority_and_dedups() {
        let list = resolve_candidates(Some("http://backend:8000"), &default_fallbacks());
        assert_eq!(list[0].as_str(), "http://backend:8000");
        assert_eq!(list.len(), 4);
        assert_eq!(list.iter().filter(|c| c.as_str() == "http://backend:8000").count(), 1);
    }

    #[test]
    fn whitespace_configuration_is_absent() {
        let list = resolve_candidates(Some("   "), &default_fallbacks());
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].as_str(), "http://127.0.0.1:8000");
    }

    #[test]
    fn duplicates_inside_table_are_removed() {
        let table = vec![
            "http://a".to_string(),
            "http://b".to_string(),
            "http://a".to_string(),
            "".to_string(),
        ];
        let list = resolve_candidates(Some("http://b"), &table);
        assert_eq!(addrs(&list), vec!["http://b", "http://a"]);
    }
}
