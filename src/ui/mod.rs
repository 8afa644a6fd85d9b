pub mod dashboard;
pub mod dialogs;
pub mod form_field;
pub mod keybindings;
pub mod paginated_list;
pub mod panels;
pub mod terminal_guard;
pub mod wizard;

pub use dashboard::Dashboard;
