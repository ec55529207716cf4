use crate::{
    domain::{entry::format_calories, EntryKind},
    utils::build_info,
    view::{parse_entry, parse_limit},
};

use super::{
    context::{CommandError, CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandRegistry},
};

pub(crate) fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(CommandEntry::new(
        "meal",
        "Record a meal",
        "meal <name> <calories>",
        cmd_meal,
    ));
    registry.register(CommandEntry::new(
        "workout",
        "Record a workout",
        "workout <name> <calories>",
        cmd_workout,
    ));
    registry.register(CommandEntry::new(
        "remove",
        "Remove a meal or workout by list position or id prefix",
        "remove <meal|workout> <position|id>",
        cmd_remove,
    ));
    registry.register(CommandEntry::new(
        "limit",
        "Change the daily calorie limit",
        "limit <calories>",
        cmd_limit,
    ));
    registry.register(CommandEntry::new(
        "reset",
        "Clear all meals and workouts (the limit is kept)",
        "reset",
        cmd_reset,
    ));
    registry.register(
        CommandEntry::new(
            "list",
            "List meals and workouts, optionally filtered by name",
            "list [text]",
            cmd_list,
        )
        .with_aliases(&["ls"]),
    );
    registry.register(CommandEntry::new(
        "summary",
        "Show totals against the limit",
        "summary",
        cmd_summary,
    ));
    registry.register(CommandEntry::new(
        "check",
        "Verify the running total against the recorded entries",
        "check",
        cmd_check,
    ));
    registry.register(CommandEntry::new(
        "backup",
        "Write a backup of the store",
        "backup [note]",
        cmd_backup,
    ));
    registry.register(CommandEntry::new(
        "backups",
        "List backups, newest first",
        "backups",
        cmd_backups,
    ));
    registry.register(CommandEntry::new(
        "restore",
        "Replace the current data with a backup",
        "restore <backup|position>",
        cmd_restore,
    ));
    registry.register(CommandEntry::new(
        "version",
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new("help", "Show this help", "help", cmd_help));
    registry.register(
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    );
    registry
}

fn cmd_meal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, calories) = split_name_and_calories(args, "meal <name> <calories>")?;
    let entry = parse_entry(&name, calories, EntryKind::Meal)?;
    context.session.add_meal(entry)?;
    Ok(())
}

fn cmd_workout(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, calories) = split_name_and_calories(args, "workout <name> <calories>")?;
    let entry = parse_entry(&name, calories, EntryKind::Workout)?;
    context.session.add_workout(entry)?;
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, reference] = args else {
        return Err(usage("remove <meal|workout> <position|id>"));
    };
    let kind = parse_kind(kind)?;
    let Some(id) = context.session.view().resolve(kind, reference) else {
        output::warning(format!("No {} matches `{}`.", kind, reference));
        return Ok(());
    };
    if !context.confirm(&format!("Remove this {}?", kind))? {
        output::info("Nothing removed.");
        return Ok(());
    }
    let removed = match kind {
        EntryKind::Meal => context.session.remove_meal(id)?,
        EntryKind::Workout => context.session.remove_workout(id)?,
    };
    if !removed {
        output::warning(format!("No {} matches `{}`.", kind, reference));
    }
    Ok(())
}

fn cmd_limit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let raw = args.join(" ");
    let value = parse_limit(&raw)?;
    context.session.change_limit(value)?;
    output::success(format!("Daily limit set to {} kcal", format_calories(value)));
    Ok(())
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Clear all meals and workouts?")? {
        output::info("Nothing cleared.");
        return Ok(());
    }
    context.session.reset()?;
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.session.view().render_lists(&args.join(" "));
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.session.refresh();
    Ok(())
}

fn cmd_check(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let report = context.session.ledger().verify();
    if report.is_consistent() {
        output::success(format!(
            "Total {} kcal matches the recorded entries.",
            format_calories(report.cached_total)
        ));
        return Ok(());
    }
    if report.has_drift() {
        output::warning(format!(
            "Stored total {} kcal differs from entries ({} kcal).",
            format_calories(report.cached_total),
            format_calories(report.derived_total)
        ));
    }
    for id in report
        .duplicate_meal_ids
        .iter()
        .chain(report.duplicate_workout_ids.iter())
    {
        output::warning(format!("Entry id {} is recorded more than once.", id));
    }
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = args.join(" ");
    let note = (!note.trim().is_empty()).then_some(note.as_str());
    let name = context.session.ledger().store().backup(note)?;
    output::success(format!("Backup written: {}", name));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.session.ledger().store().list_backups()?;
    if backups.is_empty() {
        output::info("No backups yet.");
        return Ok(());
    }
    output::section("Backups");
    for (idx, name) in backups.iter().enumerate() {
        output::line(format!("  {:>2}. {}", idx + 1, name));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage("restore <backup|position>"));
    };
    let backups = context.session.ledger().store().list_backups()?;
    let name = match reference.parse::<usize>() {
        Ok(position) => position.checked_sub(1).and_then(|idx| backups.get(idx)),
        Err(_) => backups.iter().find(|name| name.as_str() == *reference),
    }
    .cloned()
    .ok_or_else(|| CommandError::InvalidArguments(format!("backup `{}` not found", reference)))?;

    if !context.confirm(&format!("Replace current data with {}?", name))? {
        output::info("Nothing restored.");
        return Ok(());
    }
    output::success(format!("Restoring {}", name));
    context
        .session
        .restore(|store| store.restore_backup(&name))?;
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::section("Commands");
    for entry in context.registry.list() {
        let aliases = if entry.aliases.is_empty() {
            String::new()
        } else {
            format!(" (also: {})", entry.aliases.join(", "))
        };
        output::line(format!(
            "  {:<36} {}{}",
            entry.usage, entry.description, aliases
        ));
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

/// The last argument is the calories; everything before it is the name.
fn split_name_and_calories<'a>(
    args: &[&'a str],
    usage_text: &str,
) -> Result<(String, &'a str), CommandError> {
    match args.split_last() {
        Some((calories, name)) if !name.is_empty() => Ok((name.join(" "), *calories)),
        _ => Err(usage(usage_text)),
    }
}

fn parse_kind(raw: &str) -> Result<EntryKind, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "meal" | "meals" => Ok(EntryKind::Meal),
        "workout" | "workouts" => Ok(EntryKind::Workout),
        other => Err(CommandError::InvalidArguments(format!(
            "expected `meal` or `workout`, got `{}`",
            other
        ))),
    }
}

fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", text))
}
