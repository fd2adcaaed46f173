//! Command dispatch and handlers.

pub mod ls;
pub mod metadata;
pub mod rm;
pub mod sourcemaps;
pub mod update_browsers;
pub mod upload;
pub mod view;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// Commands that reach the network run on a current-thread tokio
/// runtime built here; everything else is synchronous filesystem work.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Ls { directory, all, json, filter } => {
            ls::run(directory, all, json, filter.as_deref())
        }
        Command::Upload { id, opts } => block_on(upload::run_upload(id, opts)),
        Command::Process { id, opts } => block_on(upload::run_process(id, opts)),
        Command::UploadAll { opts, filter, batch_size, include_in_progress } => {
            block_on(upload::run_upload_all(opts, filter, batch_size, include_in_progress))
        }
        Command::View { id, opts } => block_on(view::run(Some(id), opts)),
        Command::ViewLatest { opts } => block_on(view::run(None, opts)),
        Command::Rm { id, directory } => rm::run_one(&id, directory),
        Command::RmAll { directory } => rm::run_all(directory),
        Command::UpdateBrowsers { directory } => update_browsers::run(directory),
        Command::UploadSourcemaps {
            group,
            api_key,
            dry_run,
            extensions,
            ignore,
            root,
            server,
            paths,
        } => block_on(sourcemaps::run(
            group, api_key, dry_run, extensions, ignore, root, server, paths,
        )),
        Command::Metadata { init, keys, warn, filter, directory } => {
            metadata::run(init.as_deref(), &keys, warn, filter.as_deref(), directory)
        }
    }
}

/// Runs an async command handler to completion.
fn block_on<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    runtime.block_on(future)
}
