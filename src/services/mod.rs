pub mod allow_list;
pub mod firestore;
pub mod identity;
pub mod images;
pub mod trips;
