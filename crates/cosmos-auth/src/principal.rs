/// The view of a user needed to build claims.
///
/// Supplied fully populated by whatever owns user storage; the issuer never
/// looks anything up itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Role title
    pub role: String,
    /// Permission titles granted through the role
    pub permissions: Vec<String>,
}
