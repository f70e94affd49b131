//! MediaWiki request parameters for page fetches.
//!
//! Two actions are used:
//! - `query` keyed by `titles`, for the current version of an article
//! - `parse` keyed by `oldid`, for one historical revision

use super::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Query,
    Parse,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Parse => "parse",
        }
    }
}

/// What one page fetch asks the API for.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub action: Action,
    pub title: &'a str,
    /// Required for `Action::Parse`.
    pub oldid: Option<&'a str>,
    pub with_links: bool,
    /// Revisions, description terms and backlinks travel together.
    pub with_revisions: bool,
}

impl PageRequest<'_> {
    /// The value that identifies this request's page on the wire.
    pub fn target(&self) -> &str {
        match self.action {
            Action::Query => self.title,
            Action::Parse => self.oldid.unwrap_or(self.title),
        }
    }
}

/// Build the query string for a page fetch (without continuation tokens).
pub fn page_params(req: &PageRequest<'_>) -> QueryParams {
    let mut params = QueryParams::new();
    let mut set = |k: &str, v: &str| {
        params.insert(k.to_string(), v.to_string());
    };

    set("action", req.action.as_str());
    set("format", "json");

    match req.action {
        Action::Query => {
            let mut prop = vec!["info", "langlinks", "pageprops", "redirects"];
            set("titles", req.title);
            set("redirects", "1");
            set("rdlimit", "max");
            set("inprop", "displaytitle");
            set("llprop", "autonym|langname|url");
            set("lllimit", "max");
            set("ppprop", "wikibase_item");

            if req.with_links {
                prop.push("links");
                set("pllimit", "max");
            }

            if req.with_revisions {
                prop.extend(["revisions", "pageterms", "linkshere"]);
                set("rvlimit", "max");
                set("rvprop", "ids|flags|timestamp|roles|flagged");
                set("wbptterms", "description");
                set("lhlimit", "max");
            }

            set("prop", &prop.join("|"));
        }
        Action::Parse => {
            let mut prop = vec!["langlinks", "displaytitle", "properties"];
            if let Some(oldid) = req.oldid {
                set("oldid", oldid);
            }
            if req.with_links {
                prop.push("links");
            }
            set("prop", &prop.join("|"));
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_for_plain_fetch() {
        let p = page_params(&PageRequest {
            action: Action::Query,
            title: "Bitwa pod Cedynią",
            oldid: None,
            with_links: false,
            with_revisions: false,
        });
        assert_eq!(p["action"], "query");
        assert_eq!(p["titles"], "Bitwa pod Cedynią");
        assert_eq!(p["prop"], "info|langlinks|pageprops|redirects");
        assert!(!p.contains_key("pllimit"));
    }

    #[test]
    fn unique_fetch_adds_links_revisions_terms_backlinks() {
        let p = page_params(&PageRequest {
            action: Action::Query,
            title: "A",
            oldid: None,
            with_links: true,
            with_revisions: true,
        });
        assert_eq!(
            p["prop"],
            "info|langlinks|pageprops|redirects|links|revisions|pageterms|linkshere"
        );
        assert_eq!(p["rvlimit"], "max");
        assert_eq!(p["wbptterms"], "description");
    }

    #[test]
    fn parse_params_use_oldid() {
        let req = PageRequest {
            action: Action::Parse,
            title: "A",
            oldid: Some("12345"),
            with_links: true,
            with_revisions: false,
        };
        let p = page_params(&req);
        assert_eq!(p["action"], "parse");
        assert_eq!(p["oldid"], "12345");
        assert!(!p.contains_key("titles"));
        assert_eq!(req.target(), "12345");
    }
}
