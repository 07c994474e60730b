fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "espidf" {
        embuild::espidf::sysenv::output();
    }

    if std::env::var("CARGO_FEATURE_TFLM").is_ok() {
        // Host builds use the default C++ compiler; ESP builds need the
        // Embuild toolchain g++.
        // Typically: .embuild/espressif/tools/riscv32-esp-elf/esp-<VER>/riscv32-esp-elf/bin/riscv32-esp-elf-g++
        let compiler = if target_os == "espidf" {
            Some(find_compiler().unwrap_or_else(|| "riscv32-esp-elf-g++".into()))
        } else {
            None
        };
        build_model(compiler.as_deref());
    }
}

fn find_compiler() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;
    // Check local .embuild first, then global ~/.espressif
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").ok().map(PathBuf::from)?;
    let search_dirs = vec![
        manifest_dir.join(".embuild"),
        dirs::home_dir().map(|h| h.join(".espressif")).unwrap_or_default(),
    ];

    for root in search_dirs {
        let tools_dir = root.join("espressif/tools/riscv32-esp-elf");
        let Ok(entries) = std::fs::read_dir(&tools_dir) else {
            continue;
        };
        // Find the versioned directory (e.g., esp-13.2.0_20240530)
        for entry in entries.flatten() {
            let candidate = entry.path().join("riscv32-esp-elf/bin/riscv32-esp-elf-g++");
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Compile the TFLite Micro runtime, the magic wand model and the C shim
/// exporting `magic_wand_classify` / `magic_wand_classify_int8`.
fn build_model(compiler_path: Option<&std::path::Path>) {
    use std::path::PathBuf;

    let sdk_root = PathBuf::from("magic_wand_inferencing");

    let mut build = cc::Build::new();
    if let Some(compiler) = compiler_path {
        build.compiler(compiler);
    }

    build
        .cpp(true)
        .flag("-std=c++17")
        .flag("-O3")
        .define("TF_LITE_STATIC_MEMORY", None)
        .define("TF_LITE_DISABLE_X86_NEON", None)
        .include(&sdk_root)
        .include(sdk_root.join("tensorflow"))
        .include(sdk_root.join("third_party/flatbuffers/include"))
        .include(sdk_root.join("third_party/gemmlowp"))
        .include(sdk_root.join("third_party/ruy"));

    add_source_files(&mut build, &sdk_root);

    build.compile("magic-wand-model");

    println!("cargo:rerun-if-changed=magic_wand_inferencing");
}

fn add_source_files(build: &mut cc::Build, dir: &std::path::Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        println!("cargo:warning=missing model sources in {}", dir.display());
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            add_source_files(build, &path);
        } else if let Some(ext) = path.extension() {
            if ext == "c" || ext == "cpp" || ext == "cc" {
                build.file(&path);
            }
        }
    }
}
