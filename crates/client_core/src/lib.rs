//! Operator-side logic for the studio console: the education resource
//! list/editor, admin role helpers, the console landing check and the
//! public portfolio gallery, plus the hosted HTTP backend.

pub mod admin;
pub mod education;
pub mod landing;
pub mod portfolio;
pub mod supabase;

pub use admin::{check_admin_status, get_all_admins, update_admin_role};
pub use education::{EducationListController, EducationPanel, ListEvent, ResourceFormValues};
pub use landing::{enter_admin_console, AdminAccess};
pub use portfolio::{filter_portfolios, PortfolioGallery};
pub use supabase::{SupabaseClient, SupabaseConfig, SupabaseConfigError};
