//! Contact list handlers

use anyhow::{Context, Result};

use super::output::print_json;
use super::AppContext;
use crate::cli::{ContactArgs, ContactsCommand};
use crate::types::{Contact, NewContact};

pub fn handle_contacts(ctx: &AppContext, cmd: ContactsCommand) -> Result<()> {
    let book = &ctx.contacts;
    match cmd {
        ContactsCommand::List => print_contacts(ctx, &book.list()),
        ContactsCommand::Add(args) => {
            let contact = book.add(NewContact::from(args))?;
            if ctx.json {
                return print_json(&contact);
            }
            println!("Added {} ({})", contact.full_name, contact.id);
            Ok(())
        }
        ContactsCommand::Search { query } => print_contacts(ctx, &book.search(&query)),
        ContactsCommand::Delete { id } => {
            if !book.delete(&id)? {
                anyhow::bail!("Contact '{}' not found", id);
            }
            println!("Deleted contact {}", id);
            Ok(())
        }
        ContactsCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear all contacts without --yes");
            }
            book.clear()?;
            println!("All contacts cleared");
            Ok(())
        }
        ContactsCommand::Summary => {
            let summary = book.summary();
            if ctx.json {
                return print_json(&summary);
            }
            println!("Contacts:   {}", summary.total);
            println!("Categories: {}", summary.categories);
            println!("Companies:  {}", summary.companies);
            Ok(())
        }
        ContactsCommand::Import { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let report = book.import_csv(&content)?;
            if ctx.json {
                return print_json(&report);
            }
            println!(
                "Imported {} contact(s), skipped {}",
                report.imported, report.skipped
            );
            Ok(())
        }
        ContactsCommand::Export { out } => {
            let csv = book.export_csv()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported contacts to {}", path.display());
                }
                None => print!("{}", csv),
            }
            Ok(())
        }
    }
}

impl From<ContactArgs> for NewContact {
    fn from(args: ContactArgs) -> Self {
        Self {
            full_name: args.name,
            email: args.email,
            phone: args.phone,
            company: args.company,
            location: args.location,
            category: args.category,
            notes: args.notes,
        }
    }
}

fn print_contacts(ctx: &AppContext, contacts: &[Contact]) -> Result<()> {
    if ctx.json {
        return print_json(contacts);
    }
    if contacts.is_empty() {
        println!("No contacts found");
    }
    let plan = ctx.composer.pipeline().plan();
    for c in contacts {
        let mut line = format!(
            "{}  {}  <{}>  {}",
            c.id,
            c.full_name,
            c.email,
            plan.format_for_display(&c.phone)
        );
        if !c.company.is_empty() {
            line.push_str(&format!("  [{}]", c.company));
        }
        if !c.category.is_empty() {
            line.push_str(&format!("  #{}", c.category));
        }
        println!("{}", line);
    }
    Ok(())
}
