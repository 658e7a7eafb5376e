use sqlx::FromRow;

/// Set id under which the forum stores master (default) templates.
pub const MASTER_SID: i64 = -2;

#[derive(Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Template {
    pub tid: i64,
    pub title: String,
    pub template: String,
    pub sid: i64,
    pub version: String,
    pub dateline: i64,
}

impl Template {
    pub fn is_master(&self) -> bool {
        self.sid == MASTER_SID
    }
}

/// A template together with the folder group it was classified into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupedTemplate {
    pub template: Template,
    pub group_name: String,
}

#[derive(Clone, FromRow, Debug)]
pub struct TemplateSet {
    pub sid: i64,
    pub title: String,
}

#[derive(Clone, FromRow, Debug)]
pub struct TemplateGroup {
    pub gid: i64,
    pub prefix: String,
    pub title: String,
    pub isdefault: i64,
}

#[derive(Clone, FromRow, Debug)]
pub struct Theme {
    pub tid: i64,
    pub name: String,
}

#[derive(Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Stylesheet {
    pub tid: i64,
    pub name: String,
    pub stylesheet: String,
    pub cachefile: String,
    pub lastmodified: i64,
}
