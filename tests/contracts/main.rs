mod declaration;
mod sessions;
