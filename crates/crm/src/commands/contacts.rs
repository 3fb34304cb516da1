//! Contact command handlers.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tabled::Tabled;
use tokio::time::MissedTickBehavior;

use crm_core::{Contact, CoreError, Crm, MutationRequest, QueryEntry, QueryStatus};

use crate::cli::{ContactFields, ContactsArgs, ContactsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ContactRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Company")]
    company: String,
}

impl From<&Contact> for ContactRow {
    fn from(c: &Contact) -> Self {
        Self {
            id: contact_id(c),
            name: c.full_name(),
            email: c.email.clone(),
            company: c.company.clone(),
        }
    }
}

fn contact_id(c: &Contact) -> String {
    c.id.map(|id| id.to_string()).unwrap_or_default()
}

fn detail(c: &Contact, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", output::heading(&c.full_name(), color));
    let fields = [
        ("ID", contact_id(c)),
        ("Email", c.email.clone()),
        ("Phone", c.phone.clone()),
        ("Company", c.company.clone()),
        ("Position", c.position.clone()),
        ("Notes", c.notes.clone()),
    ];
    for (name, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
        let _ = writeln!(out, "  {:<10} {value}", output::label(name, color));
    }
    out.trim_end().to_owned()
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Turn a settled cache entry into its data or the error it carries.
fn into_result<T>(entry: &QueryEntry<T>) -> Result<Arc<T>, CliError> {
    match &entry.status {
        QueryStatus::Success(data) => Ok(Arc::clone(data)),
        QueryStatus::Error(err) => Err(CoreError::clone(err).into()),
        QueryStatus::Idle | QueryStatus::Loading => Err(CliError::Cancelled),
    }
}

/// Overlay the given fields onto `base`.
fn apply_fields(mut base: Contact, fields: ContactFields) -> Contact {
    let ContactFields {
        first_name,
        last_name,
        email,
        phone,
        company,
        position,
        notes,
    } = fields;

    let slots = [
        (&mut base.first_name, first_name),
        (&mut base.last_name, last_name),
        (&mut base.email, email),
        (&mut base.phone, phone),
        (&mut base.company, company),
        (&mut base.position, position),
        (&mut base.notes, notes),
    ];
    for (slot, value) in slots {
        if let Some(value) = value {
            *slot = value;
        }
    }
    base
}

/// Validate, save, and seed the detail cache with the result.
async fn save(crm: &Crm, request: MutationRequest) -> Result<Contact, CliError> {
    request.contact().validate()?;
    let saved = crm.save(request).await?;
    crm.seed_contact(&saved);
    Ok(saved)
}

fn print_contact(contact: &Contact, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, contact, |c| detail(c, color), contact_id);
    output::print_output(&out, global.quiet);
}

fn render_contacts(contacts: &[Contact], global: &GlobalOpts) -> String {
    output::render_list(&global.output, contacts, |c| ContactRow::from(c), contact_id)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(crm: &Crm, args: ContactsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ContactsCommand::List => {
            let entry = crm.contacts().settled().await;
            let contacts = into_result(&entry)?;
            output::print_output(&render_contacts(&contacts, global), global.quiet);
            Ok(())
        }

        ContactsCommand::Get { id } => {
            let entry = crm.contact(id).settled().await;
            print_contact(&*into_result(&entry)?, global);
            Ok(())
        }

        ContactsCommand::Create(fields) => {
            let contact = apply_fields(Contact::default(), fields);
            let saved = save(crm, MutationRequest::create(contact)).await?;
            if !global.quiet {
                eprintln!("Contact #{} created", contact_id(&saved));
            }
            print_contact(&saved, global);
            Ok(())
        }

        ContactsCommand::Edit { id, fields } => {
            let entry = crm.contact(id).settled().await;
            let current = Contact::clone(&*into_result(&entry)?);
            let saved = save(crm, MutationRequest::update(id, apply_fields(current, fields))).await?;
            if !global.quiet {
                eprintln!("Contact #{id} updated");
            }
            print_contact(&saved, global);
            Ok(())
        }

        ContactsCommand::Watch { interval } => watch(crm, interval, global).await,
    }
}

/// Print the list every time it settles; invalidate it on each tick so
/// the cache refetches in the background. Runs until Ctrl-C.
async fn watch(crm: &Crm, interval: u64, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut sub = crm.contacts();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    let mut pending = Some(sub.settled().await);
    loop {
        if let Some(entry) = pending.take() {
            render_frame(&entry, global, color);
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                crm.invalidate_contacts();
            }
            changed = sub.changed() => match changed {
                Some(entry) if entry.is_settled() => pending = Some(entry),
                Some(_) => {}
                None => break,
            },
        }
    }

    crm.shutdown();
    Ok(())
}

fn render_frame(entry: &QueryEntry<Vec<Contact>>, global: &GlobalOpts, color: bool) {
    let stamp = entry
        .updated_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_default();

    match into_result(entry) {
        Ok(contacts) => {
            if matches!(global.output, crate::cli::OutputFormat::Table) && !global.quiet {
                let title = format!("{} contacts at {stamp}", contacts.len());
                println!("{}", output::heading(&title, color));
            }
            output::print_output(&render_contacts(&contacts, global), global.quiet);
        }
        Err(err) => {
            let err = if global.verbose == 0 { err.without_detail() } else { err };
            eprintln!("[{stamp}] {:?}", miette::Report::new(err));
        }
    }
}
