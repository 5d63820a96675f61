use crate::error::{Result, ScanError};
use prospect_core::{
    CommentRecord, CommentSelectors, ProfileRecord, ProfileSelectors, RawRecord, RecordKind,
    SelectorConfig,
};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Records read from one page, with element accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    /// Result elements found on the page, kept or not
    pub elements_seen: usize,
    /// Elements dropped for lacking their identity fields
    pub dropped: usize,
}

struct ProfileMatchers {
    item: Selector,
    name: Selector,
    title: Selector,
    location: Selector,
    profile_url: Selector,
}

impl ProfileMatchers {
    fn new(selectors: &ProfileSelectors) -> Result<Self> {
        Ok(Self {
            item: compile(&selectors.result_item)?,
            name: compile(&selectors.name)?,
            title: compile(&selectors.title)?,
            location: compile(&selectors.location)?,
            profile_url: compile(&selectors.profile_url)?,
        })
    }
}

struct CommentMatchers {
    item: Selector,
    name: Selector,
    comment: Selector,
    timestamp: Selector,
    likes: Selector,
}

impl CommentMatchers {
    fn new(selectors: &CommentSelectors) -> Result<Self> {
        Ok(Self {
            item: compile(&selectors.comment_item)?,
            name: compile(&selectors.name)?,
            comment: compile(&selectors.comment)?,
            timestamp: compile(&selectors.timestamp)?,
            likes: compile(&selectors.likes)?,
        })
    }
}

/// Parses fetched documents into raw records.
///
/// Each field is read independently: a missing field is absent on that record
/// only. Elements without their identity fields are dropped and counted.
pub struct RecordExtractor {
    profiles: ProfileMatchers,
    comments: CommentMatchers,
    base_url: Url,
}

impl RecordExtractor {
    /// Compile selectors once. `base_url` resolves relative profile links.
    pub fn new(selectors: &SelectorConfig, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ScanError::InvalidLocator {
            locator: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            profiles: ProfileMatchers::new(&selectors.profiles)?,
            comments: CommentMatchers::new(&selectors.comments)?,
            base_url,
        })
    }

    pub fn extract(&self, kind: RecordKind, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        let item = match kind {
            RecordKind::Profile => &self.profiles.item,
            RecordKind::Comment => &self.comments.item,
        };

        for (index, element) in document.select(item).enumerate() {
            extraction.elements_seen += 1;
            let record = match kind {
                RecordKind::Profile => self.parse_profile(&element).map(RawRecord::from),
                RecordKind::Comment => self.parse_comment(&element).map(RawRecord::from),
            };
            match record {
                Some(record) => extraction.records.push(record),
                None => {
                    tracing::warn!("Dropping {} element {}: identity fields missing", kind, index);
                    extraction.dropped += 1;
                }
            }
        }

        tracing::debug!(
            "Extracted {} of {} {} elements",
            extraction.records.len(),
            extraction.elements_seen,
            kind
        );
        extraction
    }

    fn parse_profile(&self, element: &ElementRef) -> Option<ProfileRecord> {
        let name = field(element, &self.profiles.name, "name")?;

        let profile_url = element
            .select(&self.profiles.profile_url)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| self.resolve(href));
        if profile_url.is_none() {
            tracing::debug!("No profile link for {}", name);
        }

        Some(ProfileRecord {
            name: Some(name),
            title: field(element, &self.profiles.title, "title"),
            location: field(element, &self.profiles.location, "location"),
            profile_url,
        })
    }

    fn parse_comment(&self, element: &ElementRef) -> Option<CommentRecord> {
        let name = field(element, &self.comments.name, "name")?;
        let comment = field(element, &self.comments.comment, "comment")?;

        let likes = field(element, &self.comments.likes, "likes")
            .map_or(0, |text| parse_count(&text));

        Some(CommentRecord {
            name: Some(name),
            comment: Some(comment),
            timestamp: field(element, &self.comments.timestamp, "timestamp"),
            likes,
        })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        match self.base_url.join(href) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!("Unresolvable link '{}': {}", href, e);
                None
            }
        }
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScanError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Whitespace-normalized text of the first match, `None` when missing or blank.
fn field(element: &ElementRef, selector: &Selector, label: &str) -> Option<String> {
    let Some(found) = element.select(selector).next() else {
        tracing::debug!("Field '{}' not found", label);
        return None;
    };
    let text = found.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        tracing::debug!("Field '{}' is blank", label);
        None
    } else {
        Some(text)
    }
}

/// Parse a count by keeping only its digits. Unparsable input counts as 0.
pub fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
