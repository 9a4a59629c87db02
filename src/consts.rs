pub mod store_const {
    pub const USER_TABLE: &str = "users";
    pub const INVITATION_TABLE: &str = "invitations";
    pub const COLOR_TABLE: &str = "colors";
    pub const CATEGORY_TABLE: &str = "categories";
}

pub mod hierarchy_const {
    /// Hard cap on upward `parent_id` walks so malformed or cyclic data can
    /// never hang an authorization check.
    pub const MAX_PARENT_HOPS: usize = 10;
}

pub mod analysis_const {
    /// Inputs shorter than this are rejected before any external call.
    pub const MIN_ANALYSIS_CHARS: u64 = 20;
}
