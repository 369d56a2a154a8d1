use std::path::PathBuf;
use std::sync::OnceLock;

use xsdvalidate::XsdRuntime;

/// Runtime shared by every test of one test binary
///
/// Only one runtime may be active per process, and tests of a binary run on
/// parallel threads, so they all borrow this one. It is never cleaned up.
pub fn shared_runtime() -> &'static XsdRuntime {
    static RUNTIME: OnceLock<XsdRuntime> = OnceLock::new();
    RUNTIME.get_or_init(|| XsdRuntime::init().expect("failed to initialize libxml2 runtime"))
}

/// Test fixture paths
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        Self { fixtures_dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.fixtures_dir.join(name)
    }

    pub fn shiporder_schema(&self) -> PathBuf {
        self.path("test1_pass.xsd")
    }

    /// Schema referencing a type it never defines
    pub fn unresolved_schema(&self) -> PathBuf {
        self.path("invalid_schema.xsd")
    }

    /// Directory holding `shiporder_root.xsd`, which includes its sibling
    /// `shiporder_types.xsd`
    pub fn remote_dir(&self) -> PathBuf {
        self.path("remote")
    }

    pub fn including_schema(&self) -> PathBuf {
        self.remote_dir().join("shiporder_root.xsd")
    }

    pub fn valid_xml(&self) -> PathBuf {
        self.path("test1_pass.xml")
    }

    /// Closing tag mismatch on line 9
    pub fn mismatched_tag_xml(&self) -> PathBuf {
        self.path("test1_fail1.xml")
    }

    /// Undefined entity on line 3
    pub fn undefined_entity_xml(&self) -> PathBuf {
        self.path("test1_fail1_1.xml")
    }

    /// `shipto` without `country`
    pub fn missing_child_xml(&self) -> PathBuf {
        self.path("test1_fail2.xml")
    }

    /// Unexpected `name1` element on line 5
    pub fn unexpected_element_xml(&self) -> PathBuf {
        self.path("test1_fail3.xml")
    }

    /// Bad `quantity` on line 13 and bad `price` on line 19
    pub fn bad_values_xml(&self) -> PathBuf {
        self.path("test1_fail4.xml")
    }

    pub fn read(&self, path: PathBuf) -> Vec<u8> {
        std::fs::read(&path).unwrap_or_else(|err| panic!("reading {}: {}", path.display(), err))
    }

    pub fn schema_source(&self) -> String {
        self.shiporder_schema().to_string_lossy().into_owned()
    }
}

impl Default for TestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that an error message mentions every expected fragment
pub fn assert_mentions(message: &str, fragments: &[&str]) {
    for fragment in fragments {
        assert!(
            message.contains(fragment),
            "expected {:?} to mention {:?}",
            message,
            fragment
        );
    }
}
