//! Inline item markup: `[[Item name|short info]]`.
//!
//! Response text is split into plain runs and item references at render time
//! only. Anything that is not exactly a two-field double-bracket tag stays
//! plain text, including half-closed brackets and extra pipes.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const WIKI_IMAGE_BASE: &str = "https://oldschool.runescape.wiki/images/";

static ITEM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|\n]+)\|([^\[\]|\n]*)\]\]").expect("item tag pattern is valid")
});

/// An item mentioned in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemReference<'a> {
    pub display_name: &'a str,
    pub short_info: &'a str,
}

impl ItemReference<'_> {
    /// Wiki page key: trimmed name with spaces replaced by underscores
    pub fn lookup_key(&self) -> String {
        lookup_key(self.display_name)
    }

    /// Best-effort image for tooltips. `None` means render the text alone.
    pub fn image_url(&self) -> Option<Url> {
        item_image_url(self.display_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Item(ItemReference<'a>),
}

/// Lazy segment iterator. Clone it (or call [`parse`] again) to restart.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
    pending: Option<ItemReference<'a>>,
}

pub fn parse(text: &str) -> Segments<'_> {
    Segments {
        text,
        pos: 0,
        pending: None,
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.take() {
            return Some(Segment::Item(item));
        }
        if self.pos >= self.text.len() {
            return None;
        }

        let Some(caps) = ITEM_TAG.captures_at(self.text, self.pos) else {
            let rest = &self.text[self.pos..];
            self.pos = self.text.len();
            return Some(Segment::Text(rest));
        };

        let whole = caps.get(0)?;
        let item = ItemReference {
            display_name: caps.get(1).map_or("", |m| m.as_str()),
            short_info: caps.get(2).map_or("", |m| m.as_str()),
        };
        let start = self.pos;
        self.pos = whole.end();

        if whole.start() > start {
            self.pending = Some(item);
            Some(Segment::Text(&self.text[start..whole.start()]))
        } else {
            Some(Segment::Item(item))
        }
    }
}

pub fn lookup_key(name: &str) -> String {
    name.trim().replace(' ', "_")
}

pub fn item_image_url(name: &str) -> Option<Url> {
    let key = lookup_key(name);
    if key.is_empty() {
        return None;
    }
    Url::parse(WIKI_IMAGE_BASE)
        .and_then(|base| base.join(&format!("{}.png", key)))
        .ok()
}

/// Text handed to speech synthesis: item tags become their display names.
pub fn strip_for_speech(text: &str) -> String {
    parse(text)
        .map(|segment| match segment {
            Segment::Text(text) => text,
            Segment::Item(item) => item.display_name,
        })
        .collect()
}

/// Terminal-friendly rendering: `Name (info)` for each item.
pub fn render_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in parse(text) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Item(item) if item.short_info.trim().is_empty() => {
                out.push_str(item.display_name)
            }
            Segment::Item(item) => {
                out.push_str(item.display_name);
                out.push_str(" (");
                out.push_str(item.short_info);
                out.push(')');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item<'a>(name: &'a str, info: &'a str) -> Segment<'a> {
        Segment::Item(ItemReference {
            display_name: name,
            short_info: info,
        })
    }

    #[test]
    fn test_single_item() {
        let segments: Vec<_> = parse("[[Name|Info]]").collect();
        assert_eq!(segments, vec![item("Name", "Info")]);
    }

    #[test]
    fn test_item_after_text() {
        let segments: Vec<_> = parse("Tell me about the [[Abyssal whip|Slash: +82]]").collect();
        assert_eq!(
            segments,
            vec![
                Segment::Text("Tell me about the "),
                item("Abyssal whip", "Slash: +82"),
            ]
        );
    }

    #[test]
    fn test_mixed_sequence() {
        let text = "Use the [[Abyssal whip|Slash: +82, Str: +82]] and sip a [[Prayer potion(4)|Restores Prayer points]] when low.";
        let segments: Vec<_> = parse(text).collect();
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[1], item("Abyssal whip", "Slash: +82, Str: +82"));
        assert_eq!(segments[3], item("Prayer potion(4)", "Restores Prayer points"));
        assert_eq!(segments[4], Segment::Text(" when low."));
    }

    #[test]
    fn test_malformed_tags_stay_plain() {
        for text in [
            "[[Abyssal whip|Slash",
            "[[Abyssal whip]]",
            "[Abyssal whip|Slash]]",
            "[[a|b|c]]",
            "[[|info]]",
            "plain text with | pipes ]] and [[ brackets",
        ] {
            let segments: Vec<_> = parse(text).collect();
            assert_eq!(segments, vec![Segment::Text(text)], "input: {}", text);
        }
    }

    #[test]
    fn test_nested_looking_brackets_first_match_wins() {
        let segments: Vec<_> = parse("[[[[Rune scimitar|Slash +45]]]]").collect();
        assert_eq!(
            segments,
            vec![
                Segment::Text("[["),
                item("Rune scimitar", "Slash +45"),
                Segment::Text("]]"),
            ]
        );
    }

    #[test]
    fn test_adjacent_items_do_not_overlap() {
        let segments: Vec<_> = parse("[[A|1]][[B|2]]").collect();
        assert_eq!(segments, vec![item("A", "1"), item("B", "2")]);
    }

    #[test]
    fn test_empty_info_is_allowed() {
        let segments: Vec<_> = parse("[[Coins|]]").collect();
        assert_eq!(segments, vec![item("Coins", "")]);
    }

    #[test]
    fn test_long_info_is_not_truncated() {
        let info = "Slash: +82, Str: +82, and a very long line of stats nobody asked for";
        let text = format!("[[Abyssal whip|{}]]", info);
        let segments: Vec<_> = parse(&text).collect();
        assert_eq!(segments, vec![item("Abyssal whip", info)]);
    }

    #[test]
    fn test_reparsing_plain_output_is_stable() {
        let text = "[[broken|tag and [[Dragon dagger|Fast stab]] then ]] text";
        for segment in parse(text) {
            if let Segment::Text(plain) = segment {
                let again: Vec<_> = parse(plain).collect();
                assert_eq!(again, vec![Segment::Text(plain)]);
            }
        }
    }

    #[test]
    fn test_iterator_is_restartable() {
        let segments = parse("a [[B|c]] d");
        let first: Vec<_> = segments.clone().collect();
        let second: Vec<_> = segments.collect();
        assert_eq!(first, second);
        assert!(parse("").next().is_none());
    }

    #[test]
    fn test_strip_for_speech() {
        assert_eq!(
            strip_for_speech("Equip the [[Dragon dagger|Fast stab]]"),
            "Equip the Dragon dagger"
        );
    }

    #[test]
    fn test_render_plain() {
        assert_eq!(
            render_plain("Wield a [[Dragon scimitar|Slash +67]]."),
            "Wield a Dragon scimitar (Slash +67)."
        );
    }

    #[test]
    fn test_lookup_key_and_image_url() {
        let whip = ItemReference {
            display_name: "  Abyssal whip ",
            short_info: "",
        };
        assert_eq!(whip.lookup_key(), "Abyssal_whip");
        assert_eq!(
            whip.image_url().unwrap().as_str(),
            "https://oldschool.runescape.wiki/images/Abyssal_whip.png"
        );
        assert!(item_image_url("   ").is_none());
    }
}
