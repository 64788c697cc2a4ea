//! Test fixtures - SDK archives and fake collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use vendor_setup::{
    ConsentProvider, Dependency, DiskImageTool, EnvironmentCheck, PackageManager, Platform,
    Result, SourceList,
};

/// A devel bundle laid out like the SDL `-VC.zip` releases:
/// `{name}-{version}/include/{header}` plus a library.
pub fn sdk_zip(name: &str, version: &str, header: &str) -> Vec<u8> {
    let root = format!("{}-{}", name, version);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    zip.add_directory(format!("{}/", root), options).unwrap();
    zip.start_file(format!("{}/include/{}", root, header), options)
        .unwrap();
    zip.write_all(format!("/* {} {} */\n", name, version).as_bytes())
        .unwrap();
    zip.start_file(format!("{}/lib/x64/{}.lib", root, name), options)
        .unwrap();
    zip.write_all(&[0u8; 512]).unwrap();
    zip.start_file(format!("{}/README-SDL.txt", root), options)
        .unwrap();
    zip.write_all(b"Please distribute this file with the SDL runtime environment.")
        .unwrap();

    zip.finish().unwrap().into_inner()
}

/// Windows descriptor for `{name} 1.0` with the marker `{name}-1.0/include/{name}.h`.
pub fn archive_dep(vendor: &Path, name: &str, sources: SourceList) -> Dependency {
    Dependency::new(
        name,
        "1.0",
        Platform::Windows,
        sources,
        vendor,
        vendor
            .join(format!("{}-1.0", name))
            .join("include")
            .join(format!("{}.h", name)),
    )
}

/// Every file under `root`, relative and sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Answers from a script and records every prompt.
pub struct RecordingConsent {
    answers: RefCell<Vec<bool>>,
    pub prompts: RefCell<Vec<String>>,
}

impl RecordingConsent {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().rev().copied().collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl ConsentProvider for RecordingConsent {
    fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no scripted answer left")
        })
    }
}

pub struct HostIsFine;

impl EnvironmentCheck for HostIsFine {
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// Disk-image tool that must never be reached.
pub struct NoDiskImages;

impl DiskImageTool for NoDiskImages {
    fn attach(&self, image: &Path, _mount_point: &Path) -> Result<()> {
        panic!("unexpected attach of {}", image.display());
    }

    fn detach(&self, mount_point: &Path) -> Result<()> {
        panic!("unexpected detach of {}", mount_point.display());
    }
}

/// Package manager that must never be reached.
pub struct NoPackageManager;

impl PackageManager for NoPackageManager {
    fn name(&self) -> &str {
        "none"
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        panic!("unexpected package install: {:?}", packages);
    }
}
