//! `srcinfo cache ...` and `srcinfo defines`.

use super::Workspace;
use crate::build;
use crate::cache::CacheVariable;
use crate::toolchain::{C_COMPILER_VAR, CXX_COMPILER_VAR};
use crate::ui;
use anyhow::Result;
use colored::*;
use std::path::PathBuf;

pub fn cache_get(ws: &Workspace, name: &str) -> Result<()> {
    println!("{}", ws.cache.lookup_or_fail(name)?);
    Ok(())
}

/// `INTERNAL`/`STATIC` entries are CMake bookkeeping; hidden unless `all`.
pub fn visible_variables(ws: &Workspace, all: bool) -> Result<Vec<CacheVariable>> {
    let mut vars = Vec::new();
    for var in ws.cache.iter()? {
        let var = var?;
        if all || !matches!(var.kind.as_str(), "INTERNAL" | "STATIC") {
            vars.push(var);
        }
    }
    Ok(vars)
}

pub fn cache_list(ws: &Workspace, all: bool) -> Result<()> {
    let mut table = ui::Table::new(&["Name", "Type", "Value"]);
    for var in visible_variables(ws, all)? {
        table.add_row(vec![var.name.green().to_string(), var.kind, var.value]);
    }

    if table.is_empty() {
        println!("{} (empty)", "ℹ".blue());
    } else {
        table.print();
    }
    Ok(())
}

pub fn print_defines(ws: &Workspace, cxx: bool, as_args: bool) -> Result<()> {
    let var = if cxx { CXX_COMPILER_VAR } else { C_COMPILER_VAR };
    let compiler = PathBuf::from(ws.cache.lookup_or_fail(var)?);

    if as_args {
        for arg in build::defines_as_args(&compiler)? {
            println!("{}", arg);
        }
    } else {
        println!("{}", build::defines_as_source(&compiler)?);
    }
    Ok(())
}
