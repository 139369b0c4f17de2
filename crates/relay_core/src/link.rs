use std::fmt;

const GENRE_MARKER: &str = ",#genre#";
const TIMESTAMP_MARKER: &str = "更新时间";
const DISCLAIMER_MARKER: &str = "Disclaimer";
const OPERATOR_SEPARATOR: char = '$';

/// A playable channel address, optionally tagged with the operator that serves it.
///
/// Serialized as `{name},{url}` or `{name},{url}${operator}`. A link read back from a list
/// keeps its source line and is written out exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelLink {
    pub name: String,
    pub url: String,
    pub operator: Option<String>,
    source: Option<String>,
}

impl ChannelLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            operator: None,
            source: None,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self.source = None;
        self
    }

    /// Parses a `name,url[$operator]` data line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (name, rest) = line.split_once(',')?;
        let (url, operator) = match rest.split_once(OPERATOR_SEPARATOR) {
            Some((url, operator)) => (url.trim(), Some(operator.trim())),
            None => (rest.trim(), None),
        };
        if url.is_empty() {
            return None;
        }
        Some(Self {
            name: name.trim().to_string(),
            url: url.to_string(),
            operator: operator.filter(|o| !o.is_empty()).map(ToOwned::to_owned),
            source: Some(line.to_string()),
        })
    }

    /// The trimmed line this link was parsed from, if any.
    pub fn source_line(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn operator_label(&self) -> &str {
        self.operator.as_deref().unwrap_or("unknown")
    }
}

impl fmt::Display for ChannelLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            return f.write_str(source);
        }
        write!(f, "{},{}", self.name, self.url)?;
        if let Some(operator) = &self.operator {
            write!(f, "{OPERATOR_SEPARATOR}{operator}")?;
        }
        Ok(())
    }
}

/// Classification of a single line of a channel list artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListLine {
    Header(String),
    Link(ChannelLink),
    Ignored,
}

impl ListLine {
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim();
        if line.is_empty()
            || line.contains(GENRE_MARKER)
            || line.contains(TIMESTAMP_MARKER)
            || line.contains(DISCLAIMER_MARKER)
        {
            return ListLine::Header(line.to_string());
        }
        match ChannelLink::parse(line) {
            Some(link) => ListLine::Link(link),
            None => ListLine::Ignored,
        }
    }
}

/// A channel list split into header lines (in order) and data links (in order).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelList {
    pub headers: Vec<String>,
    pub links: Vec<ChannelLink>,
}

pub fn parse_channel_list(text: &str) -> ChannelList {
    let mut list = ChannelList::default();
    for raw in text.lines() {
        match ListLine::parse(raw) {
            ListLine::Header(line) => list.headers.push(line),
            ListLine::Link(link) => list.links.push(link),
            ListLine::Ignored => {}
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_tag_is_split_from_url() {
        let link = ChannelLink::parse("CCTV1,http://1.2.3.4:8080/hls/1/index.m3u8$电信").unwrap();
        assert_eq!(link.name, "CCTV1");
        assert_eq!(link.url, "http://1.2.3.4:8080/hls/1/index.m3u8");
        assert_eq!(link.operator.as_deref(), Some("电信"));
        assert_eq!(
            link.to_string(),
            "CCTV1,http://1.2.3.4:8080/hls/1/index.m3u8$电信"
        );
    }

    #[test]
    fn untagged_link_reports_unknown_operator() {
        let link = ChannelLink::parse("CCTV2,http://h:1/hls/2/index.m3u8").unwrap();
        assert_eq!(link.operator, None);
        assert_eq!(link.operator_label(), "unknown");
    }

    #[test]
    fn parsed_line_is_written_back_unchanged() {
        let empty_tag = ChannelLink::parse("CCTV1,http://1.2.3.4:8080/hls/1/index.m3u8$").unwrap();
        assert_eq!(empty_tag.operator, None);
        assert_eq!(empty_tag.url, "http://1.2.3.4:8080/hls/1/index.m3u8");
        assert_eq!(
            empty_tag.to_string(),
            "CCTV1,http://1.2.3.4:8080/hls/1/index.m3u8$"
        );

        let spaced =
            ChannelLink::parse("  CCTV2 , http://1.2.3.4:8080/hls/2/index.m3u8 $ 电信 ").unwrap();
        assert_eq!(spaced.name, "CCTV2");
        assert_eq!(spaced.url, "http://1.2.3.4:8080/hls/2/index.m3u8");
        assert_eq!(spaced.operator_label(), "电信");
        assert_eq!(
            spaced.to_string(),
            "CCTV2 , http://1.2.3.4:8080/hls/2/index.m3u8 $ 电信"
        );
    }

    #[test]
    fn built_link_serializes_from_fields() {
        let link = ChannelLink::new("CCTV3", "http://h:1/hls/3/index.m3u8").with_operator("移动");
        assert_eq!(link.source_line(), None);
        assert_eq!(link.to_string(), "CCTV3,http://h:1/hls/3/index.m3u8$移动");
    }

    #[test]
    fn header_lines_are_recognized() {
        assert_eq!(ListLine::parse(""), ListLine::Header(String::new()));
        assert!(matches!(ListLine::parse("央视频道,#genre#"), ListLine::Header(_)));
        assert!(matches!(
            ListLine::parse("2024-01-01 00:00:00,https://x/LOGO/Disclaimer.mp4"),
            ListLine::Header(_)
        ));
        assert_eq!(ListLine::parse("no separator here"), ListLine::Ignored);
    }
}
