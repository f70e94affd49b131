//! In-memory `WikiApi` for tests and offline runs.
//!
//! Pages are registered per (language, target), where the target is the title
//! for `query` requests and the oldid for `parse` requests. Page fixtures are
//! rendered per request, honoring the `prop` parameter the way the real API
//! does: links only come back when asked for, and so on.
//!
//! Raw fragment sequences can be registered to exercise continuation: the
//! first request gets fragment 0, each request carrying a `*continue`
//! parameter gets the next one.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use super::{ApiError, QueryParams, WikiApi};

type FixtureKey = (String, String);

#[derive(Debug, Clone)]
enum FixtureEntry {
    Page(FixturePage),
    Revision(FixturePage, String),
    Fragments(Vec<Value>),
}

#[derive(Debug, Default)]
struct FixtureState {
    requests: HashMap<FixtureKey, usize>,
    cursors: HashMap<FixtureKey, usize>,
    failures: HashMap<FixtureKey, u32>,
    log: Vec<(String, QueryParams)>,
}

#[derive(Debug, Default)]
pub struct FixtureApi {
    entries: HashMap<FixtureKey, FixtureEntry>,
    state: Mutex<FixtureState>,
}

impl FixtureApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` for `query` requests on its title.
    pub fn with_page(mut self, language: &str, page: FixturePage) -> Self {
        let key = (language.to_string(), page.title.clone());
        self.entries.insert(key, FixtureEntry::Page(page));
        self
    }

    /// Serve `page` for `parse` requests on `oldid`.
    pub fn with_revision(mut self, language: &str, oldid: &str, page: FixturePage) -> Self {
        let key = (language.to_string(), oldid.to_string());
        self.entries
            .insert(key, FixtureEntry::Revision(page, oldid.to_string()));
        self
    }

    /// Serve raw response fragments in order for `target`.
    pub fn with_fragments(mut self, language: &str, target: &str, fragments: Vec<Value>) -> Self {
        let key = (language.to_string(), target.to_string());
        self.entries.insert(key, FixtureEntry::Fragments(fragments));
        self
    }

    /// Fail the next `times` requests for `target` with a transient fault.
    pub fn with_transient_failures(self, language: &str, target: &str, times: u32) -> Self {
        self.state
            .lock()
            .failures
            .insert((language.to_string(), target.to_string()), times);
        self
    }

    /// Requests seen for one target, failed attempts included.
    pub fn requests(&self, language: &str, target: &str) -> usize {
        self.state
            .lock()
            .requests
            .get(&(language.to_string(), target.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Every request in arrival order.
    pub fn request_log(&self) -> Vec<(String, QueryParams)> {
        self.state.lock().log.clone()
    }
}

#[async_trait]
impl WikiApi for FixtureApi {
    async fn get(&self, language: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let target = params
            .get("titles")
            .or_else(|| params.get("oldid"))
            .cloned()
            .ok_or_else(|| ApiError::Fatal("request has neither titles nor oldid".to_string()))?;
        let key = (language.to_string(), target.clone());
        let continued = params.keys().any(|k| k.ends_with("continue"));

        let fragment_idx = {
            let mut st = self.state.lock();
            st.log.push((language.to_string(), params.clone()));
            *st.requests.entry(key.clone()).or_insert(0) += 1;

            if let Some(left) = st.failures.get_mut(&key) {
                if *left > 0 {
                    *left -= 1;
                    return Err(ApiError::Transient(format!(
                        "injected connect failure for {language}:{target}"
                    )));
                }
            }

            let cursor = st.cursors.entry(key.clone()).or_insert(0);
            *cursor = if continued { *cursor + 1 } else { 0 };
            *cursor
        };

        let prop = params.get("prop").map(String::as_str).unwrap_or_default();
        let action = params.get("action").map(String::as_str).unwrap_or("query");

        match (action, self.entries.get(&key)) {
            (_, Some(FixtureEntry::Fragments(frags))) => frags
                .get(fragment_idx)
                .cloned()
                .ok_or_else(|| ApiError::Fatal(format!("no fragment {fragment_idx} for {target}"))),
            ("query", Some(FixtureEntry::Page(page))) => Ok(page.to_query_response(prop)),
            ("parse", Some(FixtureEntry::Revision(page, oldid))) => {
                Ok(page.to_parse_response(oldid, prop))
            }
            ("parse", _) => Ok(json!({
                "error": {"code": "nosuchrevid", "info": format!("There is no revision with ID {target}.")}
            })),
            _ => Ok(FixturePage::missing(target).to_query_response(prop)),
        }
    }
}

/// Declarative description of one article as the API would report it.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    pub title: String,
    pub pageid: u64,
    pub wikibase_item: Option<String>,
    pub display_title: Option<String>,
    pub description: Option<String>,
    pub links: Vec<String>,
    pub langlinks: Vec<(String, String)>,
    pub redirects: Vec<String>,
    pub revisions: Vec<(u64, String)>,
    pub backlinks: Vec<String>,
    pub missing: bool,
}

impl FixturePage {
    pub fn new(title: impl Into<String>, wikibase_item: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            pageid: stable_pageid(&title),
            title,
            wikibase_item: Some(wikibase_item.into()),
            ..Self::default()
        }
    }

    pub fn missing(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            missing: true,
            ..Self::default()
        }
    }

    pub fn without_wikibase_item(mut self) -> Self {
        self.wikibase_item = None;
        self
    }

    pub fn display_title(mut self, title: impl Into<String>) -> Self {
        self.display_title = Some(title.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn links<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.extend(titles.into_iter().map(Into::into));
        self
    }

    pub fn langlink(mut self, language: impl Into<String>, title: impl Into<String>) -> Self {
        self.langlinks.push((language.into(), title.into()));
        self
    }

    pub fn redirect(mut self, alias: impl Into<String>) -> Self {
        self.redirects.push(alias.into());
        self
    }

    pub fn revision(mut self, revid: u64, timestamp: impl Into<String>) -> Self {
        self.revisions.push((revid, timestamp.into()));
        self
    }

    pub fn backlink(mut self, title: impl Into<String>) -> Self {
        self.backlinks.push(title.into());
        self
    }

    fn shown_title(&self) -> &str {
        self.display_title.as_deref().unwrap_or(&self.title)
    }

    /// Render an `action=query` response restricted to the requested props.
    pub fn to_query_response(&self, prop: &str) -> Value {
        if self.missing {
            return json!({
                "batchcomplete": "",
                "query": {"pages": {"-1": {"ns": 0, "title": self.title, "missing": ""}}}
            });
        }
        let wants = |p: &str| prop.split('|').any(|x| x == p);

        let mut page = Map::new();
        page.insert("pageid".into(), json!(self.pageid));
        page.insert("ns".into(), json!(0));
        page.insert("title".into(), json!(self.title));
        page.insert("displaytitle".into(), json!(self.shown_title()));
        if let Some(item) = &self.wikibase_item {
            page.insert("pageprops".into(), json!({ "wikibase_item": item }));
        }
        if wants("langlinks") && !self.langlinks.is_empty() {
            let ll: Vec<_> = self
                .langlinks
                .iter()
                .map(|(lang, title)| json!({"lang": lang, "*": title}))
                .collect();
            page.insert("langlinks".into(), Value::Array(ll));
        }
        if wants("redirects") && !self.redirects.is_empty() {
            let rd: Vec<_> = self
                .redirects
                .iter()
                .map(|t| json!({"pageid": stable_pageid(t), "ns": 0, "title": t}))
                .collect();
            page.insert("redirects".into(), Value::Array(rd));
        }
        if wants("links") && !self.links.is_empty() {
            let links: Vec<_> = self
                .links
                .iter()
                .map(|t| json!({"ns": 0, "title": t}))
                .collect();
            page.insert("links".into(), Value::Array(links));
        }
        if wants("revisions") && !self.revisions.is_empty() {
            let revs: Vec<_> = self
                .revisions
                .iter()
                .map(|(id, ts)| json!({"revid": id, "parentid": 0, "timestamp": ts}))
                .collect();
            page.insert("revisions".into(), Value::Array(revs));
        }
        if wants("pageterms") {
            if let Some(desc) = &self.description {
                page.insert("terms".into(), json!({ "description": [desc] }));
            }
        }
        if wants("linkshere") && !self.backlinks.is_empty() {
            let lh: Vec<_> = self
                .backlinks
                .iter()
                .map(|t| json!({"pageid": stable_pageid(t), "ns": 0, "title": t}))
                .collect();
            page.insert("linkshere".into(), Value::Array(lh));
        }

        let mut pages = Map::new();
        pages.insert(self.pageid.to_string(), Value::Object(page));
        json!({"batchcomplete": "", "query": {"pages": pages}})
    }

    /// Render an `action=parse` response for one revision.
    pub fn to_parse_response(&self, oldid: &str, prop: &str) -> Value {
        let wants = |p: &str| prop.split('|').any(|x| x == p);

        let mut parse = Map::new();
        parse.insert("title".into(), json!(self.title));
        parse.insert("pageid".into(), json!(self.pageid));
        parse.insert("revid".into(), json!(oldid.parse::<u64>().unwrap_or(0)));
        if wants("displaytitle") {
            parse.insert("displaytitle".into(), json!(self.shown_title()));
        }
        if wants("langlinks") {
            let ll: Vec<_> = self
                .langlinks
                .iter()
                .map(|(lang, title)| json!({"lang": lang, "*": title}))
                .collect();
            parse.insert("langlinks".into(), Value::Array(ll));
        }
        if wants("links") {
            let links: Vec<_> = self
                .links
                .iter()
                .map(|t| json!({"ns": 0, "exists": "", "*": t}))
                .collect();
            parse.insert("links".into(), Value::Array(links));
        }
        if wants("properties") {
            let props: Vec<_> = self
                .wikibase_item
                .iter()
                .map(|item| json!({"name": "wikibase_item", "*": item}))
                .collect();
            parse.insert("properties".into(), Value::Array(props));
        }
        json!({ "parse": parse })
    }
}

fn stable_pageid(title: &str) -> u64 {
    // FNV-1a; fixtures only need distinct, repeatable ids.
    title.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    }) % 10_000_000
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(title: &str, prop: &str) -> QueryParams {
        let mut p = QueryParams::new();
        p.insert("action".into(), "query".into());
        p.insert("titles".into(), title.into());
        p.insert("prop".into(), prop.into());
        p
    }

    #[tokio::test]
    async fn renders_only_requested_props() {
        let api = FixtureApi::new().with_page(
            "pl",
            FixturePage::new("A", "Q1").links(["B", "C"]).langlink("en", "A_en"),
        );
        let plain = api.get("pl", &query("A", "info|langlinks")).await.unwrap();
        let page = plain["query"]["pages"].as_object().unwrap().values().next().unwrap().clone();
        assert!(page.get("links").is_none());
        assert_eq!(page["langlinks"][0]["*"], "A_en");

        let full = api.get("pl", &query("A", "info|links")).await.unwrap();
        let page = full["query"]["pages"].as_object().unwrap().values().next().unwrap().clone();
        assert_eq!(page["links"].as_array().unwrap().len(), 2);
        assert_eq!(api.requests("pl", "A"), 2);
    }

    #[tokio::test]
    async fn unknown_title_is_missing() {
        let api = FixtureApi::new();
        let v = api.get("pl", &query("Nope", "info")).await.unwrap();
        assert!(v["query"]["pages"]["-1"].get("missing").is_some());
    }

    #[tokio::test]
    async fn injected_failures_are_transient_then_clear() {
        let api = FixtureApi::new()
            .with_page("pl", FixturePage::new("A", "Q1"))
            .with_transient_failures("pl", "A", 1);
        assert!(api.get("pl", &query("A", "info")).await.unwrap_err().is_transient());
        assert!(api.get("pl", &query("A", "info")).await.is_ok());
    }

    #[tokio::test]
    async fn fragments_follow_continuation() {
        let api = FixtureApi::new().with_fragments(
            "pl",
            "A",
            vec![json!({"n": 0, "continue": {"plcontinue": "x"}}), json!({"n": 1})],
        );
        let first = api.get("pl", &query("A", "links")).await.unwrap();
        let mut next = query("A", "links");
        next.insert("plcontinue".into(), "x".into());
        let second = api.get("pl", &next).await.unwrap();
        assert_eq!(first["n"], 0);
        assert_eq!(second["n"], 1);
    }
}
