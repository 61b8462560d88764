use crate::record::Searchable;

/// Does `item` contain `query_lower` in any of `keys`?
///
/// `query_lower` must already be lowercased. Matching is OR across keys and a
/// plain substring test; missing or null values never match.
pub fn matches_query<T: Searchable + ?Sized>(item: &T, keys: &[String], query_lower: &str) -> bool {
    keys.iter().any(|key| {
        item.search_text(key)
            .map(|text| text.to_lowercase().contains(query_lower))
            .unwrap_or(false)
    })
}

/// Items of `data` matching `query` on any of `keys`, in their original order.
/// An empty query keeps everything.
pub fn filter_items<'a, T: Searchable>(data: &'a [T], keys: &[String], query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return data.iter().collect();
    }
    let query_lower = query.to_lowercase();
    data.iter()
        .filter(|item| matches_query(*item, keys, &query_lower))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn people() -> Vec<Value> {
        vec![
            json!({"id": "1", "name": "Alice", "email": "alice@example.com"}),
            json!({"id": "2", "name": "Bob", "email": "bob@example.com"}),
            json!({"id": "3", "name": null, "email": "carol@example.com"}),
        ]
    }

    #[test]
    fn empty_query_keeps_every_item() {
        let data = people();
        assert_eq!(filter_items(&data, &keys(&["name"]), "").len(), 3);
        assert_eq!(filter_items(&data, &[], "").len(), 3);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let data = people();
        let visible = filter_items(&data, &keys(&["name"]), "ALI");
        assert_eq!(visible, vec![&data[0]]);
    }

    #[test]
    fn any_key_may_match() {
        let data = people();
        let visible = filter_items(&data, &keys(&["name", "email"]), "carol");
        assert_eq!(visible, vec![&data[2]]);
    }

    #[test]
    fn null_and_missing_values_never_match() {
        let data = people();
        assert!(filter_items(&data, &keys(&["name"]), "null").is_empty());
        assert!(filter_items(&data, &keys(&["phone"]), "1").is_empty());
    }

    #[test]
    fn numbers_match_on_their_text_form() {
        let data = vec![json!({"amount": 1250}), json!({"amount": 99})];
        let visible = filter_items(&data, &keys(&["amount"]), "25");
        assert_eq!(visible, vec![&data[0]]);
    }

    #[test]
    fn keeps_original_order() {
        let data = vec![json!({"n": "b1"}), json!({"n": "a"}), json!({"n": "b2"})];
        let visible = filter_items(&data, &keys(&["n"]), "b");
        assert_eq!(visible, vec![&data[0], &data[2]]);
    }
}
