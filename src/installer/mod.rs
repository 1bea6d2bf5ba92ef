//! NSIS installer script generation.
//!
//! One template is expanded into a 32-bit and a 64-bit script. Each template line is
//! matched against the rules below in order and only the first matching rule is
//! applied; a line without any token is copied to both outputs unchanged.

mod values;

use anyhow::{Context, Result, bail};
use encoding_rs::WINDOWS_1252;
use log::{debug, info, warn};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::BundleError;
use crate::layout::{Arch, PerArch};
use crate::runtime::Runtime;

pub use values::{ICON_PATTERN, Substitutions};

pub const VERSION_TOKEN: &str = "__VERSION__";
pub const ARCHITECTURE_TOKEN: &str = "__ARCHITECTURE__";
pub const WINPYTHON_PATH_TOKEN: &str = "__WINPYTHON_PATH__";
pub const PYTHON_FOLDER_TOKEN: &str = "__PYTHON_FOLDER__";
/// Commented-out directive that only the 64-bit script enables.
pub const CL64_DIRECTIVE: &str = ";!define CL64 1";
pub const INSTALL_LOG_TOKEN: &str = "__INSTALL_LOG__";
pub const NSIS_PLUGINS_TOKEN: &str = "__NSIS_PLUGINS__";
pub const ICON_TOKEN: &str = "__HSPY_ICON__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Version,
    Architecture,
    WinPythonPath,
    PythonFolder,
    Cl64Directive,
    InstallLog,
    NsisPlugins,
    Icon,
}

const RULES: [(Rule, &str); 8] = [
    (Rule::Version, VERSION_TOKEN),
    (Rule::Architecture, ARCHITECTURE_TOKEN),
    (Rule::WinPythonPath, WINPYTHON_PATH_TOKEN),
    (Rule::PythonFolder, PYTHON_FOLDER_TOKEN),
    (Rule::Cl64Directive, CL64_DIRECTIVE),
    (Rule::InstallLog, INSTALL_LOG_TOKEN),
    (Rule::NsisPlugins, NSIS_PLUGINS_TOKEN),
    (Rule::Icon, ICON_TOKEN),
];

fn matching_rule(line: &str) -> Option<(Rule, &'static str)> {
    RULES.iter().copied().find(|(_, token)| line.contains(*token))
}

/// Expand one template line for the architecture described by `values`.
pub fn expand_line<'l>(line: &'l str, values: &Substitutions) -> Cow<'l, str> {
    let Some((rule, token)) = matching_rule(line) else {
        return Cow::Borrowed(line);
    };

    let value = match rule {
        Rule::Cl64Directive => {
            return match values.arch {
                Arch::X86 => Cow::Borrowed(line),
                Arch::X64 => {
                    let mut chars = line.chars();
                    chars.next();
                    Cow::Borrowed(chars.as_str())
                }
            };
        }
        Rule::Version => Some(values.version.as_str()),
        Rule::Architecture => Some(values.arch.label()),
        Rule::WinPythonPath => Some(values.winpython_path.as_str()),
        Rule::PythonFolder => Some(values.python_folder.as_str()),
        Rule::InstallLog => Some(values.install_log.as_str()),
        Rule::NsisPlugins => Some(values.nsis_plugins.as_str()),
        Rule::Icon => values.icon.as_deref(),
    };

    match value {
        Some(value) => Cow::Owned(line.replace(token, value)),
        None => {
            warn!(
                "No {} value for {}; copying line unchanged: {}",
                values.arch,
                token,
                line.trim_end()
            );
            Cow::Borrowed(line)
        }
    }
}

/// Expand a whole template into the 32-bit and 64-bit scripts.
///
/// Line terminators are kept as they appear in the template.
pub fn expand_template(template: &str, values: &PerArch<Substitutions>) -> PerArch<String> {
    let mut out = PerArch {
        x86: String::with_capacity(template.len()),
        x64: String::with_capacity(template.len()),
    };
    for line in template.split_inclusive('\n') {
        out.x86.push_str(&expand_line(line, &values.x86));
        out.x64.push_str(&expand_line(line, &values.x64));
    }
    out
}

/// Text encoding of a template. Scripts are written back in the same encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateEncoding {
    Utf8,
    Windows1252,
}

/// Decode template bytes: UTF-8 when they are valid UTF-8, Windows-1252 otherwise.
pub fn decode_template(bytes: Vec<u8>) -> (String, TemplateEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TemplateEncoding::Utf8),
        Err(e) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(e.as_bytes());
            (text.into_owned(), TemplateEncoding::Windows1252)
        }
    }
}

/// Encode a generated script in the template's encoding.
pub fn encode_script(script: &str, encoding: TemplateEncoding) -> Result<Cow<'_, [u8]>> {
    match encoding {
        TemplateEncoding::Utf8 => Ok(Cow::Borrowed(script.as_bytes())),
        TemplateEncoding::Windows1252 => {
            let (bytes, _, had_unmappable) = WINDOWS_1252.encode(script);
            if had_unmappable {
                bail!("Script has characters outside Windows-1252, the template's encoding");
            }
            Ok(bytes)
        }
    }
}

/// Output file name for an architecture: `<stem>-<32bit|64bit>.<ext>`.
pub fn output_name(template: &Path, arch: Arch) -> String {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "installer".to_string());
    match template.extension() {
        Some(ext) => format!("{}-{}.{}", stem, arch.label(), ext.to_string_lossy()),
        None => format!("{}-{}", stem, arch.label()),
    }
}

pub struct TemplateExpander<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> TemplateExpander<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Expand `template` and write both scripts into `output_dir`.
    #[tracing::instrument(skip(self, values))]
    pub fn expand(
        &self,
        template: &Path,
        output_dir: &Path,
        values: &PerArch<Substitutions>,
    ) -> Result<PerArch<PathBuf>> {
        if !self.runtime.exists(template) {
            return Err(BundleError::TemplateNotFound(template.to_path_buf()).into());
        }
        let bytes = self
            .runtime
            .read(template)
            .with_context(|| format!("Failed to read installer template {:?}", template))?;
        let (content, encoding) = decode_template(bytes);
        debug!("Installer template {:?} is {:?}", template, encoding);

        let scripts = expand_template(&content, values);

        self.runtime.create_dir_all(output_dir)?;
        Ok(PerArch {
            x86: self.write_script(template, output_dir, Arch::X86, &scripts.x86, encoding)?,
            x64: self.write_script(template, output_dir, Arch::X64, &scripts.x64, encoding)?,
        })
    }

    fn write_script(
        &self,
        template: &Path,
        output_dir: &Path,
        arch: Arch,
        script: &str,
        encoding: TemplateEncoding,
    ) -> Result<PathBuf> {
        let path = output_dir.join(output_name(template, arch));
        let bytes = encode_script(script, encoding)
            .with_context(|| format!("Cannot encode {} installer script {:?}", arch, path))?;
        self.runtime
            .write(&path, &bytes)
            .with_context(|| format!("Failed to write installer script {:?}", path))?;
        info!("Wrote {} installer script {:?}", arch, path);
        Ok(path)
    }
}
