use crate::{
    api::{ConnectionSelection, PageSize, Selection},
    ClientConfig, Error,
};

/// Depth of the terminal level, past which replies are not paginated
pub const TERMINAL_DEPTH: u8 = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplySource {
    /// Replies come from the paginated connection, with live updates at depth 1
    Remote,

    /// Replies come from the client-only list of replies the viewer posted
    Local,
}

/// Static description of one depth of the reply tree
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Level {
    pub depth: u8,
    pub source: ReplySource,

    /// Whether the listed replies expose their own reply count
    pub reply_count: bool,
    pub entered_live: bool,

    /// Whether the level's query also fetches the next level's first page
    pub prefetch_next: bool,

    /// Whether the reply form at this level only inserts local replies
    pub local_reply: bool,
}

pub const LEVELS: [Level; TERMINAL_DEPTH as usize] = [
    Level {
        depth: 1,
        source: ReplySource::Remote,
        reply_count: false,
        entered_live: true,
        prefetch_next: true,
        local_reply: false,
    },
    Level {
        depth: 2,
        source: ReplySource::Remote,
        reply_count: false,
        entered_live: true,
        prefetch_next: true,
        local_reply: false,
    },
    Level {
        depth: 3,
        source: ReplySource::Remote,
        reply_count: true,
        entered_live: true,
        prefetch_next: false,
        local_reply: true,
    },
    Level {
        depth: TERMINAL_DEPTH,
        source: ReplySource::Local,
        reply_count: false,
        entered_live: false,
        prefetch_next: false,
        local_reply: true,
    },
];

/// A level together with the selection its queries use
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelSpec {
    pub level: Level,
    pub selection: Selection,
    pub page_size: PageSize,
    pub is_terminal: bool,
}

impl LevelSpec {
    pub fn depth(&self) -> u8 {
        self.level.depth
    }
}

/// Build the selection of every level, deepest first, and check that each
/// remote level embeds the selection of the remote level below it
pub fn build(levels: &[Level], config: &ClientConfig) -> Result<Vec<LevelSpec>, Error> {
    validate_layout(levels)?;
    let mut specs: Vec<LevelSpec> = Vec::with_capacity(levels.len());
    let mut deeper: Option<Selection> = None;
    for (i, level) in levels.iter().enumerate().rev() {
        let selection = Selection {
            reply_count: level.reply_count,
            entered_live: level.entered_live,
            replies: match (&deeper, level.prefetch_next) {
                (Some(node), true) => Some(Box::new(ConnectionSelection {
                    first: config.initial_reply_count,
                    order_by: config.order_by,
                    node: node.clone(),
                })),
                _ => None,
            },
        };
        let next_is_remote = levels
            .get(i + 1)
            .map(|l| l.source == ReplySource::Remote)
            .unwrap_or(false);
        if let (Some(node), true) = (&deeper, next_is_remote) {
            if !selection.embeds(node) {
                return Err(Error::ShapeMismatch { depth: level.depth });
            }
        }
        deeper = match level.source {
            ReplySource::Remote => Some(selection.clone()),
            ReplySource::Local => None,
        };
        specs.push(LevelSpec {
            level: *level,
            selection,
            page_size: PageSize::First(config.initial_reply_count),
            is_terminal: i + 1 == levels.len(),
        });
    }
    specs.reverse();
    Ok(specs)
}

fn validate_layout(levels: &[Level]) -> Result<(), Error> {
    if levels.is_empty() {
        return Err(Error::InvalidLevels(String::from("no level")));
    }
    for (i, level) in levels.iter().enumerate() {
        if usize::from(level.depth) != i + 1 {
            return Err(Error::InvalidLevels(format!(
                "level #{i} has depth {} instead of {}",
                level.depth,
                i + 1
            )));
        }
        let is_last = i + 1 == levels.len();
        match (level.source, is_last) {
            (ReplySource::Local, false) => {
                return Err(Error::InvalidLevels(format!(
                    "local level at depth {} is not the terminal one",
                    level.depth
                )))
            }
            (ReplySource::Remote, true) if levels.len() > 1 => {
                return Err(Error::InvalidLevels(String::from(
                    "the terminal level must be local",
                )))
            }
            _ => (),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ReplySort;

    fn default_specs() -> Vec<LevelSpec> {
        build(&LEVELS, &ClientConfig::default()).expect("default levels are valid")
    }

    #[test]
    fn default_chain_nests_down_to_the_last_remote_level() {
        let specs = default_specs();
        assert_eq!(specs.len(), 4);
        assert!(specs[0].selection.embeds(&specs[1].selection));
        assert!(specs[1].selection.embeds(&specs[2].selection));
        assert!(specs[2].selection.replies.is_none());
        assert!(specs[2].selection.reply_count);
        assert!(!specs[1].selection.reply_count);
        assert!(specs[3].is_terminal);
        assert_eq!(specs[3].level.source, ReplySource::Local);
    }

    #[test]
    fn nested_connections_use_the_configured_page() {
        let config = ClientConfig {
            initial_reply_count: 5,
            order_by: ReplySort::CreatedAtDesc,
            live_direct_replies_insertion: false,
        };
        let specs = build(&LEVELS, &config).unwrap();
        let nested = specs[0].selection.replies.as_ref().unwrap();
        assert_eq!(nested.first, 5);
        assert_eq!(nested.order_by, ReplySort::CreatedAtDesc);
        assert_eq!(specs[0].page_size, PageSize::First(5));
    }

    #[test]
    fn missing_prefetch_is_a_shape_mismatch() {
        let mut levels = LEVELS;
        levels[1].prefetch_next = false;
        assert!(matches!(
            build(&levels, &ClientConfig::default()),
            Err(Error::ShapeMismatch { depth: 2 })
        ));
    }

    #[test]
    fn layout_errors() {
        let mut levels = LEVELS;
        levels[1].source = ReplySource::Local;
        assert!(matches!(
            build(&levels, &ClientConfig::default()),
            Err(Error::InvalidLevels(_))
        ));

        let mut levels = LEVELS;
        levels[3].source = ReplySource::Remote;
        assert!(matches!(
            build(&levels, &ClientConfig::default()),
            Err(Error::InvalidLevels(_))
        ));

        assert!(matches!(
            build(&LEVELS[1..], &ClientConfig::default()),
            Err(Error::InvalidLevels(_))
        ));
        assert!(matches!(
            build(&[], &ClientConfig::default()),
            Err(Error::InvalidLevels(_))
        ));
    }
}
