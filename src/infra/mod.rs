pub mod gotrue;
pub mod postgrest;
pub mod session;
pub mod supabase;
pub mod terminal;
