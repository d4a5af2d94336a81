/// Photo and media group sending through the Bot API
pub mod messaging;
/// Destination chat parsing
pub mod recipient;
