use cardforge_core::template::{
    is_template, parse_bin_arg, parse_count, parse_country_arg, parse_template,
};
use cardforge_core::{BatchSource, BinSelector, LiteralShape};

use super::delivery::deliver;
use super::{Bot, BotError, BotResult, Reply};

pub struct CommandInfo {
    pub command: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        command: "/start",
        usage: "/start",
        description: "Start the bot",
    },
    CommandInfo {
        command: "/register",
        usage: "/register",
        description: "Register to use the bot",
    },
    CommandInfo {
        command: "/gen",
        usage: "/gen <bin> <amount>",
        description: "Generate cards with BIN and amount",
    },
    CommandInfo {
        command: "/gg",
        usage: "/gg <amount>",
        description: "Generate cards from random bins",
    },
    CommandInfo {
        command: "/gv",
        usage: "/gv <amount>",
        description: "Generate cards from Visa bins",
    },
    CommandInfo {
        command: "/gm",
        usage: "/gm <amount>",
        description: "Generate cards from Mastercard bins",
    },
    CommandInfo {
        command: "/ga",
        usage: "/ga <amount>",
        description: "Generate cards from American Express bins",
    },
    CommandInfo {
        command: "/gc",
        usage: "/gc <country_code> <amount>",
        description: "Generate cards from bins of a specific country",
    },
    CommandInfo {
        command: "/bn",
        usage: "/bn <bin>",
        description: "Lookup BIN information",
    },
    CommandInfo {
        command: "/reload",
        usage: "/reload",
        description: "Reload the BIN dataset",
    },
    CommandInfo {
        command: "/cmds",
        usage: "/cmds",
        description: "Show this help message",
    },
];

pub fn execute_command(bot: &mut Bot, user_id: &str, input: &str) -> BotResult<Vec<Reply>> {
    let mut parts = input.split_whitespace();
    let command = match parts.next() {
        Some(cmd) => cmd,
        None => return Ok(Vec::new()),
    };
    // Group chats address commands as `/gen@botname`.
    let command = command.split('@').next().unwrap_or(command);
    let args: Vec<&str> = parts.collect();

    match command {
        "/start" => cmd_start(bot, user_id),
        "/register" => cmd_register(bot, user_id),
        "/cmds" | "/help" => {
            bot.require_registered(user_id)?;
            Ok(vec![Reply::text(help_text(
                bot.settings.generation.literal_shape,
            ))])
        }
        "/gen" => cmd_gen(bot, user_id, &args),
        "/gg" => {
            let prefixes = bot.settings.generation.random_prefixes.clone();
            cmd_amount_only(bot, user_id, &args, "/gg", BinSelector::Random(prefixes))
        }
        "/gv" => cmd_brand(bot, user_id, &args, "/gv", "VISA"),
        "/gm" => cmd_brand(bot, user_id, &args, "/gm", "MASTERCARD"),
        "/ga" => cmd_brand(bot, user_id, &args, "/ga", "AMEX"),
        "/gc" => cmd_country(bot, user_id, &args),
        "/bn" => cmd_lookup(bot, user_id, &args),
        "/reload" => cmd_reload(bot, user_id),
        _ => Ok(vec![Reply::text(format!(
            "Unknown command: {command}. Use /cmds to list commands."
        ))]),
    }
}

pub fn help_text(shape: LiteralShape) -> String {
    let mut lines = Vec::with_capacity(COMMANDS.len() + 2);
    lines.push("Here are the commands you can use:".to_string());
    for info in COMMANDS {
        lines.push(format!("{} - {}", info.usage, info.description));
        if info.command == "/gen" {
            lines.push(format!(
                "/gen {} [amount] - Generate cards from a template (xx = random)",
                shape.usage()
            ));
        }
    }
    lines.join("\n")
}

fn cmd_start(bot: &mut Bot, user_id: &str) -> BotResult<Vec<Reply>> {
    if bot.users.is_registered(user_id)? {
        return Ok(vec![Reply::text(
            "Welcome back! Use /gen <bin> <amount> to generate card details.",
        )]);
    }

    let welcome = "Welcome! Please register using /register to use the bot.";
    let hint = Reply::text("To use the bot, please register with the /register command.");
    let media = bot
        .settings
        .welcome
        .media_path
        .as_ref()
        .map(|path| bot.paths.resolve(path));
    match media {
        Some(path) if path.is_file() => Ok(vec![
            Reply::Media {
                path,
                caption: welcome.to_string(),
            },
            hint,
        ]),
        Some(path) => {
            tracing::warn!(event = "welcome_media_missing", path = %path.display());
            Ok(vec![Reply::text(welcome), hint])
        }
        None => Ok(vec![Reply::text(welcome), hint]),
    }
}

fn cmd_register(bot: &mut Bot, user_id: &str) -> BotResult<Vec<Reply>> {
    if !bot.users.register(user_id)? {
        return Ok(vec![Reply::text("You are already registered.")]);
    }
    Ok(vec![
        Reply::text("You have been registered successfully!"),
        Reply::text(help_text(bot.settings.generation.literal_shape)),
    ])
}

fn cmd_gen(bot: &mut Bot, user_id: &str, args: &[&str]) -> BotResult<Vec<Reply>> {
    bot.require_registered(user_id)?;
    let generation = &bot.settings.generation;
    let shape = generation.literal_shape;
    let max = generation.max_count;

    match args {
        [template] if is_template(template) => {
            let template = parse_template(template, shape)?;
            let count = generation.literal_default_count;
            run_batch(bot, BatchSource::Template(template), count)
        }
        [template, amount] if is_template(template) => {
            let template = parse_template(template, shape)?;
            let count = parse_count(amount, max)?;
            run_batch(bot, BatchSource::Template(template), count)
        }
        [bin, amount] => {
            let bin = parse_bin_arg(bin)?;
            let count = parse_count(amount, max)?;
            run_batch(bot, BatchSource::Selector(BinSelector::Explicit(bin)), count)
        }
        _ => Err(BotError::Usage(format!(
            "/gen <bin> <amount> or /gen {} [amount]",
            shape.usage()
        ))),
    }
}

fn cmd_amount_only(
    bot: &mut Bot,
    user_id: &str,
    args: &[&str],
    command: &str,
    selector: BinSelector,
) -> BotResult<Vec<Reply>> {
    bot.require_registered(user_id)?;
    let [amount] = args else {
        return Err(BotError::Usage(format!("{command} <amount>")));
    };
    let count = parse_count(amount, bot.settings.generation.max_count)?;
    run_batch(bot, BatchSource::Selector(selector), count)
}

fn cmd_brand(
    bot: &mut Bot,
    user_id: &str,
    args: &[&str],
    command: &str,
    brand: &str,
) -> BotResult<Vec<Reply>> {
    cmd_amount_only(
        bot,
        user_id,
        args,
        command,
        BinSelector::Brand(brand.to_string()),
    )
}

fn cmd_country(bot: &mut Bot, user_id: &str, args: &[&str]) -> BotResult<Vec<Reply>> {
    bot.require_registered(user_id)?;
    let [code, amount] = args else {
        return Err(BotError::Usage("/gc <country_code> <amount>".to_string()));
    };
    let code = parse_country_arg(code)?;
    let count = parse_count(amount, bot.settings.generation.max_count)?;
    run_batch(bot, BatchSource::Selector(BinSelector::Country(code)), count)
}

fn cmd_lookup(bot: &mut Bot, user_id: &str, args: &[&str]) -> BotResult<Vec<Reply>> {
    bot.require_registered(user_id)?;
    let [bin] = args else {
        return Err(BotError::Usage("/bn <bin>".to_string()));
    };
    let bin = parse_bin_arg(bin)?;
    let catalog = bot.catalog.catalog()?;
    let record = catalog.lookup(&bin)?;
    Ok(vec![Reply::text(format!(
        "BIN Information:\n{}",
        record.describe_full()
    ))])
}

fn cmd_reload(bot: &mut Bot, user_id: &str) -> BotResult<Vec<Reply>> {
    bot.require_registered(user_id)?;
    let catalog = bot.catalog.refresh()?;
    Ok(vec![Reply::text(format!(
        "BIN dataset reloaded: {} BINs.",
        catalog.len()
    ))])
}

fn run_batch(bot: &mut Bot, source: BatchSource, count: usize) -> BotResult<Vec<Reply>> {
    let catalog = bot.catalog.catalog()?;
    let outcome = bot.generator.run(&source, count, &catalog, &mut bot.rng)?;
    deliver(&bot.paths, &bot.settings.artifact, outcome)
}
