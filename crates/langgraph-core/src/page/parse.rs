//! Page payload extraction and parsing.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::registry::PageIdentity;
use crate::api::Action;
use crate::collections::{PageKeySet, RevisionKeys};
use crate::keys::{PageKey, RevisionKey};
use crate::{LANGUAGE_SEPARATOR, TIMESTAMP_SEPARATOR};

/// Where the page object sits in a merged response.
#[derive(Debug)]
pub(crate) enum PagePayload<'a> {
    Found(&'a Map<String, Value>),
    /// The API reported the page (or revision) as nonexistent.
    Missing(String),
    /// The response lacks the expected structure.
    Malformed(&'static str),
}

/// Locate the page object for `action` in a merged response.
pub(crate) fn locate_payload(action: Action, data: &Value) -> PagePayload<'_> {
    match action {
        Action::Query => {
            let Some(pages) = data
                .get("query")
                .and_then(|q| q.get("pages"))
                .and_then(Value::as_object)
            else {
                return PagePayload::Malformed("response has no query.pages object");
            };
            let Some((page_id, page)) = pages.iter().next() else {
                return PagePayload::Malformed("query.pages is empty");
            };
            let Some(page) = page.as_object() else {
                return PagePayload::Malformed("query.pages entry is not an object");
            };
            if page_id == "-1" || page.contains_key("missing") || page.contains_key("invalid") {
                return PagePayload::Missing(format!("page id {page_id}"));
            }
            PagePayload::Found(page)
        }
        Action::Parse => {
            if let Some(err) = data.get("error") {
                let code = err
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                return PagePayload::Missing(format!("api error {code}"));
            }
            match data.get("parse").and_then(Value::as_object) {
                Some(parse) => PagePayload::Found(parse),
                None => PagePayload::Malformed("response has no parse object"),
            }
        }
    }
}

/// Fields read out of one page payload.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedPage {
    pub display_title: Option<String>,
    pub description: Option<String>,
    pub wikibase_item: Option<String>,
    pub links: PageKeySet,
    pub langlinks: PageKeySet,
    pub backlinks: PageKeySet,
    pub revisions: RevisionKeys,
    pub aliases: BTreeSet<String>,
}

/// Parse a located page payload.
///
/// Absent sections leave the matching collection empty. A missing wikibase
/// item is logged and left `None`.
pub(crate) fn parse_page(
    payload: &Map<String, Value>,
    identity: &PageIdentity,
    make_unique: bool,
) -> ParsedPage {
    let language = identity.language.as_str();

    let display_title = str_field(payload, "displaytitle")
        .or_else(|| str_field(payload, "title"))
        .map(str::to_string);

    let links = entries(payload, "links")
        .filter_map(link_title)
        .map(|title| PageKey::new(title, language))
        .collect();

    let langlinks = entries(payload, "langlinks")
        .filter_map(|ll| {
            let lang = str_field(ll, "lang")?;
            let title = str_field(ll, "*").or_else(|| str_field(ll, "title"))?;
            Some(PageKey::new(title, lang))
        })
        .collect();

    let aliases = entries(payload, "redirects")
        .filter_map(|r| str_field(r, "title"))
        .map(str::to_string)
        .collect();

    let backlinks = entries(payload, "linkshere")
        .filter_map(|b| str_field(b, "title"))
        .map(|title| PageKey::new(title, language))
        .collect();

    let revisions = entries(payload, "revisions")
        .filter_map(|rev| parse_revision(rev, identity))
        .collect();

    let description = payload
        .get("terms")
        .and_then(|t| t.get("description"))
        .and_then(|d| match d {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(str::to_string)
        .or_else(|| display_title.clone());

    let wikibase_item = wikibase_item(payload).map(|item| {
        decorate_wikibase_item(item, language, make_unique, identity.timestamp)
    });
    if wikibase_item.is_none() {
        tracing::error!(page = %identity, "no wikibase item in payload");
    }

    ParsedPage {
        display_title,
        description,
        wikibase_item,
        links,
        langlinks,
        backlinks,
        revisions,
        aliases,
    }
}

/// Append the language-root and point-in-time markers to a wikibase item.
pub fn decorate_wikibase_item(
    item: &str,
    language: &str,
    make_unique: bool,
    timestamp: Option<OffsetDateTime>,
) -> String {
    let mut key = item.to_string();
    if make_unique {
        key.push_str(LANGUAGE_SEPARATOR);
        key.push_str(language);
    }
    if let Some(ts) = timestamp {
        key.push_str(TIMESTAMP_SEPARATOR);
        key.push_str(&format_timestamp(ts));
    }
    key
}

pub(crate) fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

fn wikibase_item(payload: &Map<String, Value>) -> Option<&str> {
    // query: pageprops.wikibase_item; parse: properties[{name, "*"}]
    payload
        .get("pageprops")
        .and_then(|p| p.get("wikibase_item"))
        .and_then(Value::as_str)
        .or_else(|| {
            entries(payload, "properties")
                .find(|p| str_field(p, "name") == Some("wikibase_item"))
                .and_then(|p| str_field(p, "*"))
        })
}

fn parse_revision(rev: &Map<String, Value>, identity: &PageIdentity) -> Option<RevisionKey> {
    let oldid = match rev.get("revid")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let raw_ts = str_field(rev, "timestamp")?;
    match OffsetDateTime::parse(raw_ts, &Rfc3339) {
        Ok(timestamp) => Some(RevisionKey::new(
            identity.title.clone(),
            oldid,
            identity.language.clone(),
            timestamp,
        )),
        Err(err) => {
            tracing::warn!(page = %identity, %raw_ts, %err, "skipping revision with unparsable timestamp");
            None
        }
    }
}

fn link_title(link: &Map<String, Value>) -> Option<&str> {
    str_field(link, "title").or_else(|| str_field(link, "*"))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn entries<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn found(v: &Value, action: Action) -> Map<String, Value> {
        match locate_payload(action, v) {
            PagePayload::Found(p) => p.clone(),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[test]
    fn sentinel_page_id_is_missing() {
        let v = json!({"query": {"pages": {"-1": {"title": "X", "missing": ""}}}});
        assert!(matches!(locate_payload(Action::Query, &v), PagePayload::Missing(_)));
    }

    #[test]
    fn parse_error_is_missing() {
        let v = json!({"error": {"code": "nosuchrevid"}});
        assert!(matches!(locate_payload(Action::Parse, &v), PagePayload::Missing(_)));
    }

    #[test]
    fn query_payload_fields() {
        let v = json!({"query": {"pages": {"5": {
            "title": "Bitwa pod Cedynią",
            "displaytitle": "Bitwa pod Cedynią",
            "pageprops": {"wikibase_item": "Q474546"},
            "links": [{"ns": 0, "title": "Mieszko I"}, {"ns": 14, "title": "Kategoria:Bitwy"}],
            "langlinks": [{"lang": "en", "*": "Battle of Cedynia"}],
            "redirects": [{"title": "Bitwa cedyńska"}],
            "linkshere": [{"title": "Cedynia"}],
            "revisions": [
                {"revid": 10, "timestamp": "2008-01-01T00:00:00Z"},
                {"revid": 20, "timestamp": "2018-01-01T00:00:00Z"}
            ],
            "terms": {"description": ["bitwa z 972 roku"]}
        }}}});
        let payload = found(&v, Action::Query);
        let id = PageIdentity::current("Bitwa pod Cedynią", "pl");
        let parsed = parse_page(&payload, &id, true);

        assert_eq!(parsed.wikibase_item.as_deref(), Some("Q474546__pl"));
        assert_eq!(parsed.links.len(), 2);
        assert!(parsed.langlinks.contains(&PageKey::new("Battle of Cedynia", "en")));
        assert!(parsed.aliases.contains("Bitwa cedyńska"));
        assert_eq!(parsed.backlinks.len(), 1);
        assert_eq!(parsed.revisions.latest().unwrap().oldid, "20");
        assert_eq!(parsed.description.as_deref(), Some("bitwa z 972 roku"));
    }

    #[test]
    fn description_falls_back_to_display_title() {
        let v = json!({"query": {"pages": {"5": {"title": "A", "displaytitle": "<i>A</i>",
            "pageprops": {"wikibase_item": "Q1"}}}}});
        let parsed = parse_page(&found(&v, Action::Query), &PageIdentity::current("A", "pl"), false);
        assert_eq!(parsed.description.as_deref(), Some("<i>A</i>"));
        assert_eq!(parsed.wikibase_item.as_deref(), Some("Q1"));
        assert!(parsed.links.is_empty());
        assert!(parsed.revisions.is_empty());
    }

    #[test]
    fn parse_payload_uses_properties_and_star_titles() {
        let v = json!({"parse": {
            "title": "A", "displaytitle": "A", "revid": 77,
            "links": [{"ns": 0, "exists": "", "*": "B"}],
            "langlinks": [{"lang": "de", "*": "A (de)"}],
            "properties": [{"name": "wikibase_item", "*": "Q9"}]
        }});
        let rev = RevisionKey::new("A", "77", "pl", datetime!(2015-02-03 4:05:06 UTC));
        let id = PageIdentity::historical(&rev);
        let parsed = parse_page(&found(&v, Action::Parse), &id, true);
        assert_eq!(
            parsed.wikibase_item.as_deref(),
            Some("Q9__pl~~2015-02-03T04:05:06Z")
        );
        assert!(parsed.links.contains(&PageKey::new("B", "pl")));
    }

    #[test]
    fn missing_wikibase_item_is_soft() {
        let v = json!({"query": {"pages": {"5": {"title": "A"}}}});
        let parsed = parse_page(&found(&v, Action::Query), &PageIdentity::current("A", "pl"), true);
        assert!(parsed.wikibase_item.is_none());
        assert_eq!(parsed.display_title.as_deref(), Some("A"));
    }
}
