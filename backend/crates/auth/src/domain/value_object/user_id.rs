use kernel::id::Id;

pub struct UserMarker;
pub type UserId = Id<UserMarker>;

pub struct LibraryMarker;
pub type LibraryId = Id<LibraryMarker>;
