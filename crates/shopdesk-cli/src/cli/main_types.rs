use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shopdesk_core::api::models::{OrderStatus, OrderType, PaymentStatus, ProductStatus};

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Command line admin dashboard for the shop backend")]
#[command(version)]
#[command(after_help = "Examples:
  shopdesk auth login --email admin@example.com   # Sign in (prompts for password)
  shopdesk product list --status active           # Active products, first page
  shopdesk product search                         # Interactive product search
  shopdesk order list --order-status pending      # Pending orders
  shopdesk order update-status 42 --status shipped
  shopdesk app-config update --shipping-cost 4.5
  shopdesk config set api_url https://shop.example.com/api

Environment Variables:
  SHOPDESK_API_URL   Backend API base URL
  RUST_LOG           Log filter (overrides --verbose)")]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Custom configuration directory path
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Backend API base URL (overrides config and SHOPDESK_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, sign out and password management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Local configuration (show, set)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Browse and update orders
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Shipping cost and pickup address
    AppConfig {
        #[command(subcommand)]
        command: AppConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user
    Status,
    /// Send a one-time password to the e-mail address
    ForgotPassword { email: String },
    /// Exchange a one-time password for a reset token
    VerifyOtp { email: String, otp: String },
    /// Set a new password with a reset token
    ResetPassword {
        token: String,
        /// New password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Change the password of the signed-in user (prompts for both passwords)
    ChangePassword,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    #[command(after_help = "Keys:
  api_url, timeout_secs, page_size, search_debounce_ms,
  security.max_login_attempts, security.lockout_minutes, security.session_timeout_hours")]
    Set { key: String, value: String },
}

/// Shared page selection for list commands
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1, help_heading = "Page Options")]
    pub page: u32,

    /// Rows per page (defaults to page_size from config)
    #[arg(long, help_heading = "Page Options")]
    pub limit: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ProductStatus>,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one product
    Get { id: String },
    /// Create a product from a JSON object
    #[command(after_help = "Example:
  shopdesk product create --data '{\"title\":\"Linen Shirt\",\"subtitle\":\"Summer\",\"price\":49,\"stock\":10,\"category\":\"c1\",\"receivingOptions\":\"both\",\"sizes\":[\"M\"],\"colors\":[\"white\"],\"isActive\":true,\"description\":\"Light linen\"}'")]
    Create {
        #[arg(long)]
        data: String,
    },
    /// Update fields of a product from a JSON object
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete a product
    Delete { id: String },
    /// Search products interactively; each input line replaces the search term
    Search {
        #[arg(long)]
        status: Option<ProductStatus>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ProductStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one category
    Get { id: String },
    /// Create a category
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        status: Option<ProductStatus>,
    },
    /// Update a category
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<ProductStatus>,
    },
    /// Delete a category
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// List orders
    List {
        #[arg(long)]
        payment_status: Option<PaymentStatus>,
        #[arg(long)]
        order_status: Option<OrderStatus>,
        #[arg(long)]
        order_type: Option<OrderType>,
        /// Earliest order date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest order date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one order
    Get { id: String },
    /// Orders placed with a customer e-mail
    ByContact { email: String },
    /// Change order and/or payment status
    UpdateStatus {
        id: String,
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        payment: Option<PaymentStatus>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppConfigCommands {
    /// Show shipping cost and pickup address
    Show,
    /// Change shipping cost and/or pickup address
    Update {
        #[arg(long)]
        shipping_cost: Option<f64>,
        #[arg(long)]
        pickup_address: Option<String>,
    },
}
