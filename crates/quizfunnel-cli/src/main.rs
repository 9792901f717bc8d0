use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use quizfunnel_core::config::Config;
use quizfunnel_core::dashboard::{Dashboard, RESET_CONFIRMATION};
use quizfunnel_core::funnel::{classify_name_input, FunnelStep, NameInput};
use quizfunnel_core::metrics::{percentage, DateRange, MetricTotals};
use quizfunnel_core::session::SessionState;
use quizfunnel_core::store::EventStore;
use quizfunnel_core::tracker::Tracker;
use quizfunnel_supabase::SupabaseStore;

/// Operator console for the quiz funnel's hosted analytics.
#[derive(Parser)]
#[command(name = "quizfunnel", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the event window and print daily metrics plus funnel totals.
    Metrics {
        /// Inclusive start of the date filter (YYYY-MM-DD).
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Inclusive end of the date filter (YYYY-MM-DD).
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    /// Record funnel events against the store (pipeline smoke test).
    Track {
        #[command(subcommand)]
        event: TrackEvent,
    },
    /// Delete the entire event history. Irreversible.
    Reset {
        /// Type DELETAR to confirm; anything else aborts.
        #[arg(long, default_value = "")]
        confirm: String,
    },
}

#[derive(Subcommand)]
enum TrackEvent {
    /// First page load of a session.
    Visit,
    /// First interaction of a session.
    Interaction,
    /// A funnel step view (name, assessment, routine, intention,
    /// audio_message, transition).
    Step { name: String },
    /// Sales page view.
    SalesView,
    /// Checkout button click.
    Checkout,
    /// Submit the name field; the operator entry point literal flips the
    /// session to ignored and purges its history.
    Name { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizfunnel=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.validate();
    let store: Arc<dyn EventStore> = Arc::new(SupabaseStore::new(&config));

    match cli.command {
        Command::Metrics {
            start_date,
            end_date,
        } => {
            run_metrics(
                store,
                DateRange {
                    start: start_date,
                    end: end_date,
                },
            )
            .await
        }
        Command::Track { event } => run_track(store, event).await,
        Command::Reset { confirm } => run_reset(store, &confirm).await,
    }
}

async fn run_metrics(store: Arc<dyn EventStore>, range: DateRange) -> Result<()> {
    let mut dashboard = Dashboard::new(store);
    if let Err(e) = dashboard.refresh().await {
        if e.is_permission_denied() {
            anyhow::bail!(
                "access to metrics denied: {e}. Check the store's security policies — \
                 the anonymous role needs SELECT on analytics_events."
            );
        }
        return Err(e.into());
    }

    for day in dashboard.metrics().iter().filter(|m| range.contains(m.date)) {
        println!(
            "{}  visits={} interactions={} sales_views={} checkouts={}",
            day.date, day.visits, day.interactions, day.sales_page_views, day.checkouts
        );
        for (step, count) in &day.steps {
            println!("    step {step}: {count}");
        }
    }

    print_summary(&dashboard.totals(range));
    Ok(())
}

fn print_summary(total: &MetricTotals) {
    println!();
    println!("Total de Visitas: {}", total.visits);
    println!(
        "Taxa de Interação: {}% ({} interações únicas)",
        percentage(total.interactions, total.visits),
        total.interactions
    );
    println!(
        "Conversão da Página de Vendas: {}%",
        percentage(total.checkouts, total.sales_page_views)
    );
    println!(
        "Conversão Global: {}%",
        percentage(total.checkouts, total.visits)
    );

    println!();
    println!("Funil do Quiz:");
    print_bar("Acessou o Site (Intro)", total.visits, total.visits);
    for step in FunnelStep::ALL {
        let count = total.steps.get(step.as_str()).copied().unwrap_or(0);
        print_bar(step.label(), count, total.visits);
    }
    print_bar(
        "Visualizou Página de Vendas",
        total.sales_page_views,
        total.visits,
    );

    println!();
    println!("Funil de Vendas:");
    print_bar(
        "Clicou em Comprar",
        total.checkouts,
        total.sales_page_views,
    );
}

fn print_bar(label: &str, value: u64, total: u64) {
    let pct = percentage(value, total);
    let filled = (pct / 5) as usize;
    println!("  {label:<30} {value:>6} ({pct:>3}%) {}", "#".repeat(filled));
}

async fn run_track(store: Arc<dyn EventStore>, event: TrackEvent) -> Result<()> {
    let mut tracker = Tracker::new(store);
    let outcome = match event {
        TrackEvent::Visit => tracker.track_visit().await,
        TrackEvent::Interaction => tracker.track_interaction().await,
        TrackEvent::Step { name } => {
            let step = FunnelStep::parse(&name)
                .ok_or_else(|| anyhow::anyhow!("unknown funnel step: {name}"))?;
            tracker.track_step(step).await
        }
        TrackEvent::SalesView => tracker.track_sales_page_view().await,
        TrackEvent::Checkout => tracker.track_checkout().await,
        TrackEvent::Name { value } => match classify_name_input(&value) {
            NameInput::DashboardRequest => {
                tracker.ignore_session().await;
                println!("operator mode: session ignored, stored history purged");
                return Ok(());
            }
            NameInput::Name(name) => {
                println!("name accepted: {name}");
                return Ok(());
            }
        },
    };
    println!("outcome: {outcome:?}  session={}", tracker.session().id());
    Ok(())
}

async fn run_reset(store: Arc<dyn EventStore>, confirm: &str) -> Result<()> {
    if confirm != RESET_CONFIRMATION {
        anyhow::bail!(
            "refusing to reset: pass --confirm {RESET_CONFIRMATION} to delete the \
             entire event history (this cannot be undone)"
        );
    }

    let mut dashboard = Dashboard::new(store);
    let mut session = SessionState::new();
    match dashboard.clear_database(&mut session).await {
        Ok(()) => {
            println!("event history cleared");
            Ok(())
        }
        Err(e) if e.is_permission_denied() => {
            anyhow::bail!(
                "reset denied by store policy: {e}. The anonymous role needs DELETE \
                 on analytics_events."
            )
        }
        Err(e) => Err(e.into()),
    }
}
