use crate::infra::{build_services, Services};
use clap::Args;
use shelter_intake::config::{AppConfig, Credentials};
use shelter_intake::intake::{parse_timestamp, IntakePage, IntakeStatus, NewIntake};
use shelter_intake::session::{user_message, AdminSession, FilterPatch};
use shelter_intake::shelters::ShelterId;
use shelter_intake::{AppError, ServiceError};

const DEMO_ADMIN: &str = "admin@demo.shelters";
const DEMO_STAFF: &str = "outreach@demo.shelters";
const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Rows per page in the administrator view
    #[arg(long, default_value_t = 5)]
    pub(crate) page_size: u32,
    /// Skip printing the CSV export at the end of the demo
    #[arg(long)]
    pub(crate) skip_export: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    config.bootstrap.admin = Some(Credentials {
        email: DEMO_ADMIN.to_string(),
        password: DEMO_PASSWORD.to_string(),
    });
    config.bootstrap.staff = Some(Credentials {
        email: DEMO_STAFF.to_string(),
        password: DEMO_PASSWORD.to_string(),
    });
    let Services {
        api,
        auth,
        shelters,
    } = build_services(&config)?;

    println!("Shelter intake demo");
    println!("Seeded {} shelters:", shelters.len());
    for shelter in &shelters {
        println!("  #{} {} ({})", shelter.id, shelter.name, shelter.address);
    }

    let downtown = shelters.first().map_or(ShelterId(1), |shelter| shelter.id);
    let records = [
        ("Avery", "Evicted, needs bed tonight", "2024-01-01T18:00:00Z"),
        ("Blake", "Family of three", "2024-01-02T09:30:00Z"),
    ];
    let mut created = Vec::new();
    for (name, reason, at) in records {
        let intake = NewIntake {
            name: Some(name.to_string()),
            reason: Some(reason.to_string()),
            ..NewIntake::for_shelter(downtown)
        };
        let created_at = parse_timestamp(at).map_err(ServiceError::validation)?;
        created.push(api.store.create_at(intake, created_at)?);
    }
    let (first, second) = (created[0].id, created[1].id);

    let mut session = AdminSession::new(api.clone(), args.page_size);

    println!("\nStaff account attempts an admin search");
    session.sign_in(auth.as_ref(), DEMO_STAFF, DEMO_PASSWORD)?;
    if let Err(err) = session.refresh() {
        println!("  refused: {}", user_message(&err));
    }

    session.sign_out();
    session.sign_in(auth.as_ref(), DEMO_ADMIN, DEMO_PASSWORD)?;
    println!("\nAdmin marks #{second} fulfilled");
    session.change_status(second, IntakeStatus::Fulfilled)?;

    println!("\nPending requests");
    let page = session.update_filters(FilterPatch::status(Some(IntakeStatus::Pending)))?;
    render_page(page);

    println!("\nAdmin marks #{first} fulfilled");
    let updated = session.change_status(first, IntakeStatus::Fulfilled)?;
    println!("  row now shows status {}", updated.status);
    render_page(session.page());

    println!("\nPending requests after refresh");
    let page = session.refresh()?;
    render_page(page);

    println!("\nAll requests");
    let page = session.update_filters(FilterPatch::status(None))?;
    render_page(page);

    if let Err(err) = session.go_to_page(0) {
        println!("\nInvalid page request: {}", user_message(&err));
    }

    if !args.skip_export {
        let export = session.export_csv()?;
        println!("\nCSV export ({} rows)", export.row_count);
        let text = export
            .as_text()
            .map_err(|_| ServiceError::Export("export was not valid UTF-8".to_string()))?;
        print!("{text}");
    }

    for id in [first, second] {
        let history = api.store.history(id)?;
        println!("\nStatus history for #{id}");
        for entry in history {
            println!(
                "  {} -> {} by {} at {}",
                entry.from,
                entry.to,
                entry.changed_by,
                entry.changed_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn render_page(page: &IntakePage) {
    println!(
        "  page {} of {} ({} total)",
        page.page,
        page.total_pages(),
        page.total
    );
    if page.items.is_empty() {
        println!("  (no requests)");
    }
    for item in &page.items {
        let shelter = item
            .shelter
            .as_ref()
            .map_or("unknown shelter", |shelter| shelter.name.as_str());
        println!(
            "  #{} {:<10} {:<9} {} created {}",
            item.id,
            item.name.as_deref().unwrap_or("-"),
            item.status.label(),
            shelter,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
