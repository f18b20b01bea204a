//! Line commands understood by the interactive wizard.

use std::path::PathBuf;
use std::str::FromStr;

use livescript_core::ScriptType;

pub const HELP: &str = "\
commands:
  tab <single-product|guest-interaction|selling-point>   switch tab
  set <field> <value>                                    set a form field
  product add | product rm <n>                           add or remove a product row
  product <n> <id|name|price|spec|sellpoint> <value>     edit a product cell
  lookup <n>                                             auto-fill product n from its id
  load <draft.ron> | save <draft.ron>                    read or write the active draft
  generate | retry | reset                               act on the active tab
  status | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductColumn {
    Id,
    Name,
    Price,
    Spec,
    Sellpoint,
}

impl FromStr for ProductColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(ProductColumn::Id),
            "name" => Ok(ProductColumn::Name),
            "price" => Ok(ProductColumn::Price),
            "spec" => Ok(ProductColumn::Spec),
            "sellpoint" => Ok(ProductColumn::Sellpoint),
            other => Err(format!("unknown product column '{other}'")),
        }
    }
}

/// Product indices are 1-based here and 0-based everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Tab(ScriptType),
    Set { field: String, value: String },
    AddProduct,
    RemoveProduct(usize),
    EditProduct {
        index: usize,
        column: ProductColumn,
        value: String,
    },
    Lookup(usize),
    Load(PathBuf),
    Save(PathBuf),
    Generate,
    Retry,
    Reset,
    Status,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<WizardCommand, String> {
    let line = line.trim();
    let (verb, rest) = split_word(line);
    match verb {
        "tab" => rest
            .parse::<ScriptType>()
            .map(WizardCommand::Tab)
            .map_err(|err| err.to_string()),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            Ok(WizardCommand::Set {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
        "product" => parse_product(rest),
        "lookup" => parse_index(rest).map(WizardCommand::Lookup),
        "load" => path_arg(rest).map(WizardCommand::Load),
        "save" => path_arg(rest).map(WizardCommand::Save),
        "generate" => Ok(WizardCommand::Generate),
        "retry" => Ok(WizardCommand::Retry),
        "reset" => Ok(WizardCommand::Reset),
        "status" | "" => Ok(WizardCommand::Status),
        "help" | "?" => Ok(WizardCommand::Help),
        "quit" | "exit" => Ok(WizardCommand::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn parse_product(rest: &str) -> Result<WizardCommand, String> {
    let (first, rest) = split_word(rest);
    match first {
        "add" => Ok(WizardCommand::AddProduct),
        "rm" | "remove" => parse_index(rest).map(WizardCommand::RemoveProduct),
        _ => {
            let index = parse_index(first)?;
            let (column, value) = split_word(rest);
            Ok(WizardCommand::EditProduct {
                index,
                column: column.parse()?,
                value: value.to_string(),
            })
        }
    }
}

fn parse_index(word: &str) -> Result<usize, String> {
    match word.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a product number starting at 1, got '{}'", word.trim())),
    }
}

fn path_arg(rest: &str) -> Result<PathBuf, String> {
    if rest.is_empty() {
        return Err("missing file path".to_string());
    }
    Ok(PathBuf::from(rest))
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}
