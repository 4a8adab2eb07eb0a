use leptos::prelude::*;

use crate::components::body::BodyText;
use crate::models::document::Project;

#[component]
pub fn ProjectArticle(project: Project) -> impl IntoView {
    view! {
        <article class="project">
            <h1>{project.title}</h1>
            <p class="description">{project.description}</p>
            <TechnologyList technologies=project.technologies/>
            <p class="links">
                {project.live_url.map(|url| view! { <a href=url rel="noopener">"Live site"</a> })}
                {project.github_url.map(|url| view! { <a href=url rel="noopener">"Source"</a> })}
            </p>
            <BodyText body=project.body/>
        </article>
    }
}

#[component]
fn TechnologyList(technologies: Vec<String>) -> impl IntoView {
    (!technologies.is_empty()).then(|| {
        view! {
            <ul class="technologies">
                {technologies
                    .into_iter()
                    .map(|tech| view! { <li>{tech}</li> })
                    .collect_view()}
            </ul>
        }
    })
}

#[component]
pub fn ProjectCard(project: Project) -> impl IntoView {
    let href = format!("/projects/{}", project.slug);

    view! {
        <li class="project-card">
            <a href=href>{project.title}</a>
            <p class="description">{project.description}</p>
            <TechnologyList technologies=project.technologies/>
        </li>
    }
}

#[component]
pub fn ProjectList(projects: Vec<Project>) -> impl IntoView {
    if projects.is_empty() {
        return view! { <p class="empty">"No projects yet."</p> }.into_any();
    }

    view! {
        <ul class="project-list">
            {projects
                .into_iter()
                .map(|project| view! { <ProjectCard project=project/> })
                .collect_view()}
        </ul>
    }
    .into_any()
}
