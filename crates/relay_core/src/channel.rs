use serde::Deserialize;

/// One channel inside a category, addressed on a relay by its numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelCategory {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// Static category -> channel -> index table. Definition order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap {
    pub categories: Vec<ChannelCategory>,
}

/// Flattened view of a single channel with its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDefinition<'a> {
    pub category: &'a str,
    pub name: &'a str,
    pub index: u32,
}

impl ChannelMap {
    pub fn new(categories: Vec<ChannelCategory>) -> Self {
        Self { categories }
    }

    /// Builds a map from `(category, [(channel, index)])` pairs, keeping order.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, Vec<(&'a str, u32)>)>,
    ) -> Self {
        let categories = pairs
            .into_iter()
            .map(|(name, channels)| ChannelCategory {
                name: name.to_string(),
                channels: channels
                    .into_iter()
                    .map(|(channel, index)| ChannelEntry {
                        name: channel.to_string(),
                        index,
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    /// Definitions in category order, then channel order.
    pub fn definitions(&self) -> impl Iterator<Item = ChannelDefinition<'_>> {
        self.categories.iter().flat_map(|category| {
            category.channels.iter().map(move |entry| ChannelDefinition {
                category: &category.name,
                name: &entry.name,
                index: entry.index,
            })
        })
    }

    pub fn channel_count(&self) -> usize {
        self.categories.iter().map(|c| c.channels.len()).sum()
    }
}
