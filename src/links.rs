//! Search and learning-resource links for a topic.
//!
//! Pure string work: no network, no model call. The topic is percent-encoded
//! with [`urlencoding::encode`], which leaves only `A-Za-z0-9-_.~` untouched,
//! and appended to each site's search URL.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};

/// One clickable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// A titled group of links, rendered as one Markdown section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    pub title: String,
    pub links: Vec<Link>,
}

/// How the topic is placed into a site URL.
#[derive(Clone, Copy)]
enum Slug {
    /// Encoded as is.
    Query,
    /// Spaces become `_` before encoding, as wiki article titles expect.
    WikiTitle,
}

struct Site {
    label: &'static str,
    prefix: &'static str,
    slug: Slug,
}

const fn site(label: &'static str, prefix: &'static str) -> Site {
    Site {
        label,
        prefix,
        slug: Slug::Query,
    }
}

const SEARCH_ENGINES: &[Site] = &[
    site("Google", "https://www.google.com/search?q="),
    site("Bing", "https://www.bing.com/search?q="),
    site("DuckDuckGo", "https://duckduckgo.com/?q="),
];

const EDUCATIONAL: &[Site] = &[
    Site {
        label: "Wikipedia",
        prefix: "https://en.wikipedia.org/wiki/",
        slug: Slug::WikiTitle,
    },
    site(
        "Khan Academy",
        "https://www.khanacademy.org/search?page_search_query=",
    ),
    site("Coursera", "https://www.coursera.org/search?query="),
    site("edX", "https://www.edx.org/search?q="),
];

const COMMUNITY: &[Site] = &[
    site("Stack Exchange", "https://stackexchange.com/search?q="),
    site("Quora", "https://www.quora.com/search?q="),
];

/// Build the link groups for `topic`.
///
/// The topic is trimmed first; a blank topic is rejected.
pub fn suggest_links(topic: &str) -> Result<Vec<LinkGroup>, StudyError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(StudyError::InvalidInput(
            "Please enter a topic to search for.".into(),
        ));
    }

    let group = |title: &str, sites: &[Site]| LinkGroup {
        title: title.to_string(),
        links: sites.iter().map(|s| s.link_for(topic)).collect(),
    };

    Ok(vec![
        group("Search Engines", SEARCH_ENGINES),
        group("Educational Platforms", EDUCATIONAL),
        group("Community Q&A", COMMUNITY),
    ])
}

impl Site {
    fn link_for(&self, topic: &str) -> Link {
        let encoded = match self.slug {
            Slug::Query => urlencoding::encode(topic).into_owned(),
            Slug::WikiTitle => urlencoding::encode(&topic.replace(' ', "_")).into_owned(),
        };
        Link {
            label: self.label.to_string(),
            url: format!("{}{}", self.prefix, encoded),
        }
    }
}

/// Render groups as Markdown: one `###` heading and bullet list per group.
pub fn render_links_markdown(topic: &str, groups: &[LinkGroup]) -> String {
    let mut out = format!("## Resources for \"{}\"\n", topic.trim());
    for group in groups {
        out.push_str(&format!("\n### {}\n\n", group.title));
        for link in &group.links {
            out.push_str(&format!("- [{}]({})\n", link.label, link.url));
        }
    }
    out
}
