//! Project and screen enumeration

use futures::future::try_join_all;

use crate::api::ApiClient;
use crate::error::Result;
use crate::pagination::{Page, fetch_all, page_count};
use crate::types::{Project, Screen};

/// List the workspace's active projects, in API order
///
/// The limit, the offset stride and the continuation check all use
/// `page_size`.
pub async fn active_projects(api: &ApiClient, page_size: u32) -> Result<Vec<Project>> {
    let projects = fetch_all(page_size, |page| api.list_projects(page)).await?;
    let total = projects.len();
    let active: Vec<Project> = projects.into_iter().filter(Project::is_active).collect();

    tracing::info!(
        workspace_id = api.workspace_id(),
        total,
        active = active.len(),
        "Enumerated projects"
    );
    Ok(active)
}

/// List every screen of `project`, stamped with the project's name
///
/// The page count comes from `project.number_of_screens` and all pages are
/// requested at once. The order of the returned screens is not significant.
pub async fn project_screens(
    api: &ApiClient,
    project: &Project,
    page_size: u32,
) -> Result<Vec<Screen>> {
    let pages = page_count(project.number_of_screens, page_size);
    if pages == 0 {
        return Ok(Vec::new());
    }

    let fetches = (0..pages).map(|index| {
        api.list_screens(
            &project.id,
            Page {
                offset: index * page_size,
                limit: page_size,
            },
        )
    });
    let screens: Vec<Screen> = try_join_all(fetches)
        .await?
        .into_iter()
        .flatten()
        .map(|mut screen| {
            screen.project_name = project.name.clone();
            screen
        })
        .collect();

    tracing::debug!(
        project_id = %project.id,
        project = %project.name,
        pages,
        screens = screens.len(),
        "Enumerated screens"
    );
    Ok(screens)
}
