//! Fuzzy search over item names.
//!
//! A query is tried word by word first: every whitespace-separated word has to appear in the
//! name, in order, with anything in between. When that finds nothing, the query is tried
//! character by character, which turns it into a subsequence match. Matching ignores case.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tiled_ipc::{Group, Item};

use crate::tree::AppState;

/// Compiled query, matching its fragments in order.
#[derive(Debug, Clone)]
pub struct FuzzyPattern {
    regex: Regex,
}

/// Piece of a highlighted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    /// Whether this piece matched the query.
    pub matched: bool,
}

impl FuzzyPattern {
    /// Pattern matching the words of `query` in order, `None` if it has no words.
    pub fn words(query: &str) -> Option<Self> {
        Self::from_fragments(query.split_whitespace())
    }

    /// Pattern matching the characters of `query` in order, `None` if it has none.
    pub fn chars(query: &str) -> Option<Self> {
        let mut buf = [0; 4];
        let chars: Vec<String> = query
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.encode_utf8(&mut buf).to_owned())
            .collect();
        Self::from_fragments(chars.iter().map(String::as_str))
    }

    fn from_fragments<'a>(fragments: impl Iterator<Item = &'a str>) -> Option<Self> {
        let groups: Vec<String> = fragments
            .map(|fragment| format!("({})", regex::escape(fragment)))
            .collect();
        if groups.is_empty() {
            return None;
        }

        // Lazy gaps keep every fragment as far left as possible.
        let pattern = groups.join(".*?");
        match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
        {
            Ok(regex) => Some(Self { regex }),
            Err(err) => {
                warn!("error compiling search pattern {pattern:?}: {err}");
                None
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Byte ranges of `name` matched by each fragment of the leftmost match.
    pub fn match_ranges(&self, name: &str) -> Option<Vec<Range<usize>>> {
        let captures = self.regex.captures(name)?;
        Some(
            captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.range())
                .collect(),
        )
    }
}

/// Items left by a search, with the pattern that selected them.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub items: Vec<Item>,
    /// Pattern the items were kept by, `None` for an empty query.
    pub pattern: Option<FuzzyPattern>,
}

impl SearchResults {
    /// Highlights `name` with the same pattern that filtered the tree.
    pub fn highlight<'a>(&self, name: &'a str) -> Vec<Span<'a>> {
        highlight_with(name, self.pattern.as_ref())
    }
}

/// Copy of `items` keeping only what matches `query`.
///
/// An item stays when its name matches or, for a group, when any of its children stays. The
/// children of a kept group are filtered too. An empty query keeps everything.
///
/// The word pattern is tried on the whole tree first, and the character pattern only when
/// the word pattern keeps nothing at all.
pub fn filter_tree(items: &[Item], query: &str) -> SearchResults {
    let Some(words) = FuzzyPattern::words(query) else {
        return SearchResults {
            items: items.to_vec(),
            pattern: None,
        };
    };

    let filtered = filter_items(items, &words);
    if !filtered.is_empty() {
        return SearchResults {
            items: filtered,
            pattern: Some(words),
        };
    }

    match FuzzyPattern::chars(query) {
        Some(chars) => SearchResults {
            items: filter_items(items, &chars),
            pattern: Some(chars),
        },
        None => SearchResults {
            items: filtered,
            pattern: Some(words),
        },
    }
}

fn filter_items(items: &[Item], pattern: &FuzzyPattern) -> Vec<Item> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Tile(tile) => pattern.is_match(&tile.name).then(|| item.clone()),
            Item::Group(group) => {
                let children = filter_items(&group.items, pattern);
                if children.is_empty() && !pattern.is_match(&group.name) {
                    return None;
                }
                Some(Item::Group(Group {
                    id: group.id.clone(),
                    name: group.name.clone(),
                    width: group.width,
                    height: group.height,
                    collapsed: group.collapsed,
                    items: children,
                    vertical: group.vertical,
                }))
            }
        })
        .collect()
}

/// Splits a single `name` into matched and unmatched pieces for display.
///
/// Uses the word pattern when it matches the name and the character pattern otherwise. When
/// showing a filtered tree, use [`SearchResults::highlight`] so that every name is highlighted
/// with the pattern the tree was filtered by.
pub fn highlight<'a>(name: &'a str, query: &str) -> Vec<Span<'a>> {
    let ranges = FuzzyPattern::words(query)
        .and_then(|pattern| pattern.match_ranges(name))
        .or_else(|| FuzzyPattern::chars(query).and_then(|pattern| pattern.match_ranges(name)))
        .unwrap_or_default();
    spans(name, ranges)
}

/// Splits `name` into pieces matched by `pattern`.
///
/// Returns the whole name as one unmatched piece when the pattern is `None` or does not match.
pub fn highlight_with<'a>(name: &'a str, pattern: Option<&FuzzyPattern>) -> Vec<Span<'a>> {
    let ranges = pattern
        .and_then(|pattern| pattern.match_ranges(name))
        .unwrap_or_default();
    spans(name, ranges)
}

/// Merges adjacent ranges and fills the gaps with unmatched pieces.
fn spans(name: &str, ranges: Vec<Range<usize>>) -> Vec<Span<'_>> {
    let mut merged: Vec<Range<usize>> = Vec::new();
    for range in ranges.into_iter().filter(|range| !range.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.end == range.start => last.end = range.end,
            _ => merged.push(range),
        }
    }

    let mut spans = Vec::new();
    let mut pos = 0;
    for range in merged {
        if range.start > pos {
            spans.push(Span {
                text: &name[pos..range.start],
                matched: false,
            });
        }
        spans.push(Span {
            text: &name[range.clone()],
            matched: true,
        });
        pos = range.end;
    }
    if pos < name.len() {
        spans.push(Span {
            text: &name[pos..],
            matched: false,
        });
    }
    spans
}

impl AppState {
    /// Tree filtered by the open search, `None` when no search is open.
    pub fn search_results(&self) -> Option<SearchResults> {
        let query = self.search()?;
        Some(filter_tree(self.items(), query))
    }
}
