//! Maps the forum's flat template titles onto folder names.
//!
//! Precedence, first hit wins:
//! 1. master templates titled `global_*` go to "Global Templates";
//! 2. the title prefix (text before the first `_`) found in the
//!    `templategroups` table;
//! 3. the hard-coded prefix patterns in [`STANDARD_PATTERNS`];
//! 4. the capitalized prefix, or "Misc Templates" when there is none.

use std::collections::HashMap;

use tokio::sync::OnceCell;

use crate::utils::db_utils::{map_db_error, Database};
use crate::utils::error::Result;
use crate::utils::logger::log_info;
use crate::utils::structs::{Template, TemplateGroup};

pub const GLOBAL_GROUP: &str = "Global Templates";
pub const MISC_GROUP: &str = "Misc Templates";

/// Checked in order against the full title.
pub const STANDARD_PATTERNS: [(&str, &str); 11] = [
    ("header_", "Header Templates"),
    ("footer_", "Footer Templates"),
    ("usercp_", "User CP Templates"),
    ("modcp_", "Moderator CP Templates"),
    ("admin_", "Admin Templates"),
    ("forum_", "Forum Templates"),
    ("member_", "Member Templates"),
    ("post_", "Posting Templates"),
    ("poll_", "Poll Templates"),
    ("rating_", "Rating Templates"),
    ("misc_", "Misc Templates"),
];

/// Language strings behind the `<lang:group_*>` titles of the default
/// template groups.
const LANG_GROUPS: [(&str, &str); 42] = [
    ("group_calendar", "Calendar"),
    ("group_forumdisplay", "Forum Display"),
    ("group_index", "Index Page"),
    ("group_error", "Error Message"),
    ("group_memberlist", "Member List"),
    ("group_multipage", "Multipage Pagination"),
    ("group_private", "Private Messaging"),
    ("group_portal", "Portal"),
    ("group_postbit", "Post Bit"),
    ("group_posticons", "Post Icon"),
    ("group_showthread", "Show Thread"),
    ("group_usercp", "User Control Panel"),
    ("group_online", "Who's Online"),
    ("group_forumbit", "Forum Bit"),
    ("group_editpost", "Edit Post"),
    ("group_forumjump", "Forum Jump"),
    ("group_moderation", "Moderation"),
    ("group_nav", "Navigation"),
    ("group_search", "Search"),
    ("group_showteam", "Show Forum Team"),
    ("group_reputation", "Reputation"),
    ("group_newthread", "New Thread"),
    ("group_newreply", "New Reply"),
    ("group_member", "Member"),
    ("group_warning", "Warning System"),
    ("group_global", "Global"),
    ("group_header", "Header"),
    ("group_managegroup", "Manage Group"),
    ("group_misc", "Miscellaneous"),
    ("group_modcp", "Moderator Control Panel"),
    ("group_announcement", "Announcement"),
    ("group_polls", "Poll"),
    ("group_post", "Post"),
    ("group_printthread", "Print Thread"),
    ("group_report", "Report"),
    ("group_smilieinsert", "Smilie Inserter"),
    ("group_stats", "Statistics"),
    ("group_xmlhttp", "XMLHTTP"),
    ("group_footer", "Footer"),
    ("group_video", "Video MyCode"),
    ("group_sendthread", "Send Thread"),
    ("group_mycode", "MyCode"),
];

/// Snapshot of the `templategroups` table keyed by lower-cased prefix.
#[derive(Clone, Debug, Default)]
pub struct GroupTable {
    groups: HashMap<String, TemplateGroup>,
}

impl GroupTable {
    pub fn new(groups: Vec<TemplateGroup>) -> Self {
        let groups = groups
            .into_iter()
            .map(|group| (group.prefix.to_lowercase(), group))
            .collect();
        GroupTable { groups }
    }

    pub async fn load(db: &Database) -> Result<Self> {
        let statement = format!(
            "SELECT CAST(gid AS SIGNED) AS gid, prefix, title, CAST(isdefault AS SIGNED) AS isdefault
             FROM {} ORDER BY gid ASC",
            db.table("templategroups")
        );
        let groups = sqlx::query_as::<_, TemplateGroup>(&statement)
            .fetch_all(db.pool())
            .await
            .map_err(|e| map_db_error("SELECT templategroups", e))?;

        log_info(&format!("Loaded {} template groups", groups.len()));
        Ok(GroupTable::new(groups))
    }

    pub fn get(&self, prefix: &str) -> Option<&TemplateGroup> {
        self.groups.get(prefix)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Loads the group table on first use and keeps it until [`GroupCache::reset`].
#[derive(Debug, Default)]
pub struct GroupCache {
    table: OnceCell<GroupTable>,
}

impl GroupCache {
    pub fn new() -> Self {
        GroupCache::default()
    }

    /// A cache that never touches the database.
    pub fn preloaded(table: GroupTable) -> Self {
        GroupCache {
            table: OnceCell::new_with(Some(table)),
        }
    }

    pub async fn get_or_load(&self, db: &Database) -> Result<&GroupTable> {
        self.table.get_or_try_init(|| GroupTable::load(db)).await
    }

    pub fn reset(&mut self) {
        self.table = OnceCell::new();
    }
}

/// Text before the first underscore, lower-cased.
pub fn base_prefix(title: &str) -> String {
    title.split('_').next().unwrap_or_default().to_lowercase()
}

/// Folder group for a template.
pub fn classify(template: &Template, groups: &GroupTable) -> String {
    if template.is_master() && template.title.starts_with("global_") {
        return GLOBAL_GROUP.to_string();
    }

    let prefix = base_prefix(&template.title);
    if let Some(group) = groups.get(&prefix) {
        return resolve_group_title(&group.title);
    }

    standard_group_name(&template.title, &prefix)
}

fn standard_group_name(title: &str, prefix: &str) -> String {
    if let Some((_, group)) = STANDARD_PATTERNS
        .iter()
        .find(|(pattern, _)| title.starts_with(pattern))
    {
        return group.to_string();
    }

    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) => format!("{}{} Templates", first.to_uppercase(), chars.as_str()),
        None => MISC_GROUP.to_string(),
    }
}

pub fn resolve_lang_key(key: &str) -> Option<&'static str> {
    LANG_GROUPS
        .iter()
        .find(|(lang_key, _)| *lang_key == key)
        .map(|(_, label)| *label)
}

/// Turns a raw `templategroups.title` into a display name.
pub fn resolve_group_title(raw_title: &str) -> String {
    if let Some(key) = raw_title
        .strip_prefix("<lang:")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return match resolve_lang_key(key) {
            Some(label) => format!("{} Templates", label),
            None => MISC_GROUP.to_string(),
        };
    }

    let title = raw_title.trim();
    if title.is_empty() {
        MISC_GROUP.to_string()
    } else if title.ends_with("Templates") {
        title.to_string()
    } else {
        format!("{} Templates", title)
    }
}

/// Makes a group name safe to use as a directory name.
pub fn sanitize_folder_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.chars().all(|c| c == '.') {
        MISC_GROUP.to_string()
    } else {
        collapsed
    }
}
