//! Copyright banner placed at the top of every generated file.

use buswrap_config::IpInfo;
use std::fmt::{self, Write};

const MIT: &[&str] = &[
    "Permission is hereby granted, free of charge, to any person obtaining",
    "a copy of this software and associated documentation files (the",
    "\"Software\"), to deal in the Software without restriction, including",
    "without limitation the rights to use, copy, modify, merge, publish,",
    "distribute, sublicense, and/or sell copies of the Software, and to",
    "permit persons to whom the Software is furnished to do so, subject to",
    "the following conditions:",
    "",
    "The above copyright notice and this permission notice shall be",
    "included in all copies or substantial portions of the Software.",
    "",
    "THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND,",
    "EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF",
    "MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND",
    "NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE",
    "LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION",
    "OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION",
    "WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.",
];

const APACHE: &[&str] = &[
    "Licensed under the Apache License, Version 2.0 (the \"License\");",
    "you may not use this file except in compliance with the License.",
    "You may obtain a copy of the License at",
    "",
    "    http://www.apache.org/licenses/LICENSE-2.0",
    "",
    "Unless required by applicable law or agreed to in writing, software",
    "distributed under the License is distributed on an \"AS IS\" BASIS,",
    "WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.",
    "See the License for the specific language governing permissions and",
    "limitations under the License.",
];

const GPL: &[&str] = &[
    "This program is free software; you can redistribute it and/or",
    "modify it under the terms of the GNU General Public License",
    "version 2 as published by the Free Software Foundation.",
    "",
    "This program is distributed in the hope that it will be useful,",
    "but WITHOUT ANY WARRANTY; without even the implied warranty of",
    "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
    "GNU General Public License for more details.",
];

/// Known license families, matched on the `info.license` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    Mit,
    Apache2,
    Bsd,
    Gpl,
    Other,
}

impl LicenseKind {
    pub fn detect(license: &str) -> Self {
        let upper = license.to_ascii_uppercase();
        if upper.contains("MIT") {
            LicenseKind::Mit
        } else if upper.contains("APACHE") {
            LicenseKind::Apache2
        } else if upper.contains("BSD") {
            LicenseKind::Bsd
        } else if upper.contains("GPL") {
            LicenseKind::Gpl
        } else {
            LicenseKind::Other
        }
    }
}

/// Year part of a `M-D-YYYY` date, or the whole string if it has another shape.
fn copyright_year(date: &str) -> &str {
    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() == 3 {
        parts[2].trim()
    } else {
        date.trim()
    }
}

fn bsd_lines(author: &str) -> Vec<String> {
    vec![
        "Redistribution and use in source and binary forms, with or without modification,".into(),
        "are permitted provided that the following conditions are met:".into(),
        String::new(),
        "1. Redistributions of source code must retain the above copyright notice,".into(),
        "this list of conditions and the following disclaimer.".into(),
        String::new(),
        format!("THIS SOFTWARE IS PROVIDED BY {} \"AS IS\" AND ANY EXPRESS OR", author),
        "IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF".into(),
        "MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT".into(),
        format!("SHALL {} BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,", author),
        "SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,".into(),
        "PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR PROFITS;".into(),
        "OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER".into(),
        "IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING".into(),
        "IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF".into(),
        "SUCH DAMAGE.".into(),
    ]
}

/// Writes the `/* ... */` banner for `info`.
pub fn write_banner(out: &mut String, info: &IpInfo) -> fmt::Result {
    writeln!(out, "/*")?;
    let year = copyright_year(&info.date);
    let holder = if info.owner.is_empty() {
        &info.author
    } else {
        &info.owner
    };
    if year.is_empty() {
        writeln!(out, "\tCopyright {}", holder)?;
    } else {
        writeln!(out, "\tCopyright {} {}", year, holder)?;
    }
    writeln!(out)?;
    if !info.author.is_empty() {
        if info.email.is_empty() {
            writeln!(out, "\tAuthor: {}", info.author)?;
        } else {
            writeln!(out, "\tAuthor: {} ({})", info.author, info.email)?;
        }
        writeln!(out)?;
    }
    if !info.license.is_empty() {
        writeln!(out, "\tSPDX-License-Identifier: {}", info.license)?;
        writeln!(out)?;
    }

    let body: Vec<String> = match LicenseKind::detect(&info.license) {
        LicenseKind::Mit => MIT.iter().map(|l| l.to_string()).collect(),
        LicenseKind::Apache2 => APACHE.iter().map(|l| l.to_string()).collect(),
        LicenseKind::Bsd => bsd_lines(holder),
        LicenseKind::Gpl => GPL.iter().map(|l| l.to_string()).collect(),
        LicenseKind::Other => Vec::new(),
    };
    for line in body {
        if line.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "\t{}", line)?;
        }
    }
    writeln!(out, "\n*/\n")
}
