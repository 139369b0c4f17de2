use crate::{ChannelLink, ChannelMap, Endpoint};

const GENRE_SUFFIX: &str = ",#genre#";

/// Fixed lines written ahead of the per-category blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    /// Already formatted local timestamp, e.g. `2024-01-01 08:00:00`.
    pub timestamp: String,
    pub disclaimer_url: String,
}

impl Preamble {
    fn lines(&self) -> Vec<String> {
        vec![
            format!("更新时间: {}（北京时间）", self.timestamp),
            String::new(),
            format!("更新时间{GENRE_SUFFIX}"),
            format!("{},{}", self.timestamp, self.disclaimer_url),
            String::new(),
        ]
    }
}

/// Cross-joins every channel with every endpoint: categories, then channels, then endpoints.
pub fn synthesize(map: &ChannelMap, endpoints: &[Endpoint]) -> Vec<ChannelLink> {
    map.definitions()
        .flat_map(|definition| {
            endpoints.iter().map(move |endpoint| {
                ChannelLink::new(definition.name, hls_url(endpoint, definition.index))
            })
        })
        .collect()
}

fn hls_url(endpoint: &Endpoint, index: u32) -> String {
    format!("http://{endpoint}/hls/{index}/index.m3u8")
}

/// Renders the channel list artifact from the output of [`synthesize`] for the same `map`:
/// preamble, then one block per category.
pub fn render_channel_list(map: &ChannelMap, links: &[ChannelLink], preamble: &Preamble) -> String {
    let per_channel = match map.channel_count() {
        0 => 0,
        channels => links.len() / channels,
    };

    let mut lines = preamble.lines();
    let mut remaining = links;
    for category in &map.categories {
        let take = (category.channels.len() * per_channel).min(remaining.len());
        let (block, rest) = remaining.split_at(take);
        remaining = rest;

        lines.push(format!("{}{GENRE_SUFFIX}", category.name));
        lines.extend(block.iter().map(ToString::to_string));
        lines.push(String::new());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
