//! Help text for REPL commands.

/// Help text displayed for the /help command.
pub const HELP_TEXT: &str = r#"Type a question in plain English to query the store, or use a command:

Querying:
  /sql <query>          - Run a read-only SELECT without the model
  /schema               - Show tables and columns in the store
  /tables               - List table names
  /export [path]        - Save the last result as CSV (default: query_results.csv)
  /temperature [value]  - Show or set the sampling temperature (0.0 - 1.0)

History:
  /history              - Toggle the history view (questions are refused while open)
  /query                - Return to the query view

Data (requires /login when an admin password is configured):
  /import <path>...     - Load CSV/TSV files or Excel/ODS workbooks
  /drop <table>         - Delete a table from the store
  /login <password>     - Unlock data commands
  /logout               - Lock data commands again

Charts:
  /visualize <table> [x y] [scatter|line|bar]
                        - Profile a table and chart a correlated column pair

  /help                 - Show this help message
  /quit, /exit          - Exit"#;

pub const USAGE_IMPORT: &str = "Usage: /import <path>...";
pub const USAGE_DROP: &str = "Usage: /drop <table>";
pub const USAGE_LOGIN: &str = "Usage: /login <password>";
pub const USAGE_VISUALIZE: &str = "Usage: /visualize <table> [x y] [scatter|line|bar]";
pub const USAGE_TEMPERATURE: &str = "Usage: /temperature [value between 0.0 and 1.0]";
