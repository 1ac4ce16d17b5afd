use anyhow::Result;

use crate::presentation::{CommandResultViewModel, ConsoleRenderer, TabList};

pub fn handle(renderer: &ConsoleRenderer) -> Result<()> {
    renderer.render(CommandResultViewModel::new(TabList::all()))
}
