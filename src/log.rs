// This file contains functions for the console output of smashbatch: section headers and
// wrapped explanatory text, both written to stderr.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use chrono::Local;
use colored::Colorize;


pub fn section_header(text: &str) {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let date = format!("({})", now);
    eprintln!();
    eprintln!("{} {}", text.bold().bright_yellow().underline(), date.dimmed());
}


pub fn explanation(text: &str) {
    eprintln!("{}", wrap_to_terminal(text).dimmed());
    eprintln!();
}


fn wrap_to_terminal(text: &str) -> String {
    let width = match term_size::dimensions_stderr() {
        Some((w, _)) => w.clamp(40, 100),
        None => 80,
    };
    wrap(text, width)
}


fn wrap(text: &str, width: usize) -> String {
    // Line continuations in the source leave runs of spaces, so those are collapsed first.
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    textwrap::fill(&text, width)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        let text = "This command runs antiSMASH on every      genome in a directory.";
        assert_eq!(wrap(text, 80), "This command runs antiSMASH on every genome in a directory.");
        let wrapped = wrap(text, 20);
        assert!(wrapped.lines().count() > 1);
        assert!(wrapped.lines().all(|l| l.len() <= 20));
    }
}
