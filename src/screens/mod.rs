pub mod dashboard;

// Single-screen dashboard:
// - node table (sortable, cursor-driven)
// - pod table for the selected node
// - status bar and help overlay ('?')
