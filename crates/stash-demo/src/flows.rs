//! Demo flows.
//!
//! Each flow drives one resource through the cache the way a page of the
//! web client would: read through a subscribed query, mutate, then read
//! the invalidated data again. Output goes to the given writer so tests
//! can capture it.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, bail};
use stash_cache::QueryClient;
use stash_core::model::{CreateTodoRequest, NewPerson, Person, PersonPatch};
use stash_resources::todos::DEFAULT_LIMIT;
use stash_resources::{
    EmployeeLatency, EmployeeMutations, EmployeeQueries, EmployeeTransport, EmployeeUpdate,
    HttpMealTransport, HttpTodoTransport, MealQueries, MealTransport, MemoryTodoStore,
    MockEmployeeTransport, StaticMealTransport, TodoMutations, TodoQueries, TodoTransport,
};
use tracing::info;

use crate::settings::StashSettings;

/// Todos seeded into the offline store: a little more than one page.
const OFFLINE_TODOS: i64 = 45;

/// The transports one run talks to.
#[derive(Clone)]
pub struct Resources {
    pub todos: Arc<dyn TodoTransport>,
    pub meals: Arc<dyn MealTransport>,
    pub employees: Arc<dyn EmployeeTransport>,
}

impl Resources {
    /// HTTP transports, or in-memory ones when `settings.offline` is set.
    /// The employee directory is always simulated.
    pub fn from_settings(settings: &StashSettings) -> anyhow::Result<Self> {
        if settings.offline {
            return Ok(Self::offline(EmployeeLatency::default()));
        }
        Ok(Self {
            todos: Arc::new(HttpTodoTransport::new(&settings.http)?),
            meals: Arc::new(HttpMealTransport::new(&settings.http)?),
            employees: Arc::new(MockEmployeeTransport::new()),
        })
    }

    pub fn offline(latency: EmployeeLatency) -> Self {
        Self {
            todos: Arc::new(MemoryTodoStore::seeded(OFFLINE_TODOS)),
            meals: Arc::new(StaticMealTransport::sample()),
            employees: Arc::new(MockEmployeeTransport::new().with_latency(latency)),
        }
    }
}

/// Page 1 through an observer, prefetch of page 2, create, toggle.
pub async fn run_todos(
    client: &QueryClient,
    transport: Arc<dyn TodoTransport>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let queries = TodoQueries::new(transport.clone());
    let mutations = TodoMutations::new(transport);

    let mut observer = client.subscribe(&queries.page(1));
    let first = observer.settled().await;
    if let Some(err) = first.error {
        return Err(err).context("loading the first todo page");
    }
    let Some(page) = first.data else {
        bail!("first todo page settled without data");
    };

    let pages = page.total_pages(DEFAULT_LIMIT);
    writeln!(out, "Todos: page 1 of {} ({} total)", pages, page.total)?;
    for todo in page.todos.iter().take(5) {
        let mark = if todo.completed { "x" } else { " " };
        writeln!(out, "  [{}] #{} {}", mark, todo.id, todo.todo)?;
    }
    if pages > 1 {
        client.prefetch_query(&queries.page(2));
    }

    let created = client
        .mutate(
            &mutations.create(),
            CreateTodoRequest::new("Review cache invalidation", 1),
        )
        .await
        .context("creating a todo")?;
    writeln!(out, "Created todo #{}: {}", created.id, created.todo)?;

    let refreshed = observer.settled().await;
    if let Some(page) = refreshed.data {
        writeln!(out, "Page 1 refreshed: {} total", page.total)?;
    }

    if let Some(target) = page.todos.first() {
        let toggled = mutations
            .toggle_complete(client, target.id)
            .await
            .context("toggling a todo")?;
        writeln!(out, "Toggled todo #{}: completed = {}", toggled.id, toggled.completed)?;
    }

    Ok(())
}

/// Catalogue listing, then two concurrent reads of the same detail.
pub async fn run_meals(
    client: &QueryClient,
    transport: Arc<dyn MealTransport>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let queries = MealQueries::new(transport);

    let meals = client
        .ensure_query_data(&queries.all())
        .await
        .context("loading the meal catalogue")?;
    writeln!(out, "Meals: {} in catalogue", meals.len())?;
    for meal in meals.iter().take(5) {
        writeln!(out, "  {} ({}, {})", meal.name, meal.category, meal.area)?;
    }

    let Some(first) = meals.first() else {
        return Ok(());
    };
    let detail = queries.detail(&first.id);
    let (a, b) = tokio::join!(client.fetch_query(&detail), client.fetch_query(&detail));
    let meal = a.context("loading a meal")?;
    let shared = b.map(|other| Arc::ptr_eq(&meal, &other)).unwrap_or(false);
    writeln!(
        out,
        "Meal {}: {} ingredients, shared fetch = {}",
        meal.name,
        meal.ingredients.len(),
        shared
    )?;
    for ingredient in &meal.ingredients {
        writeln!(out, "  {} {}", ingredient.measure, ingredient.name)?;
    }

    Ok(())
}

/// Directory listing, then create, update and delete of one employee.
pub async fn run_employees(
    client: &QueryClient,
    transport: Arc<dyn EmployeeTransport>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let queries = EmployeeQueries::new(transport.clone());
    let mutations = EmployeeMutations::new(transport);

    let directory = client
        .fetch_query(&queries.all())
        .await
        .context("loading the employee directory")?;
    writeln!(out, "Employees: {} in directory", directory.len())?;

    let Some(template) = directory.first() else {
        return Ok(());
    };
    let department = template.department.clone();
    let colleagues = client
        .fetch_query(&queries.search(&department))
        .await
        .context("searching the directory")?;
    writeln!(out, "  {} match \"{}\"", colleagues.len(), department)?;

    let created = client
        .mutate(&mutations.create(), new_hire(template))
        .await
        .context("creating an employee")?;
    writeln!(out, "Created {} ({})", created.full_name(), created.id)?;

    let update = EmployeeUpdate {
        id: created.id,
        patch: PersonPatch {
            salary: Some(created.salary.saturating_add(5_000)),
            ..PersonPatch::default()
        },
    };
    let updated = client
        .mutate(&mutations.update(), update)
        .await
        .context("updating an employee")?;
    writeln!(out, "Updated {}: salary {}", updated.full_name(), updated.salary)?;

    let deleted = client
        .mutate(&mutations.delete(), updated.id)
        .await
        .context("deleting an employee")?;
    writeln!(out, "Deleted {}", deleted)?;

    Ok(())
}

fn new_hire(template: &Person) -> NewPerson {
    NewPerson {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada.lovelace@example.com".to_string(),
        phone: template.phone.clone(),
        avatar: template.avatar.clone(),
        job_title: template.job_title.clone(),
        department: template.department.clone(),
        birth_date: template.birth_date,
        address: template.address.clone(),
        salary: template.salary,
        hire_date: template.hire_date,
    }
}

/// Runs the selected flows in order, stopping at the first failure.
pub async fn run(
    client: &QueryClient,
    resources: &Resources,
    command: crate::cli::Command,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    use crate::cli::Command;

    if matches!(command, Command::Todos | Command::All) {
        run_todos(client, resources.todos.clone(), out).await?;
    }
    if matches!(command, Command::Meals | Command::All) {
        run_meals(client, resources.meals.clone(), out).await?;
    }
    if matches!(command, Command::Employees | Command::All) {
        run_employees(client, resources.employees.clone(), out).await?;
    }

    info!(
        entries = client.entry_count(),
        hit_rate = client.metrics().hit_rate(),
        "Demo finished"
    );
    Ok(())
}
