//! Generation pipeline: load records → validate → derive → render → write.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use covenant_core::{
    CompanyRecord, ContractRecord, RecordKind, VariableMap, Violation, WorkerRecord,
    derive_contract_variables, derive_nda_variables, render, validate,
};
use covenant_store::{
    ArtifactSink, Layout, StoreError, TemplateStore, decode, load_record, load_value,
    sanitize_stem,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(
        "records failed validation ({} worker, {} contract violation(s))",
        .worker.len(),
        .contract.len()
    )]
    Invalid {
        worker: Vec<Violation>,
        contract: Vec<Violation>,
    },
}

/// Input files for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub worker: PathBuf,
    pub contract: PathBuf,
    /// Falls back to `config/company.json` under the base directory.
    pub company: Option<PathBuf>,
    /// Refuse to generate when either record has violations.
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Contract,
    Nda,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Nda => "NDA",
        }
    }
}

/// One written document.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    pub path: PathBuf,
    pub unresolved: BTreeSet<String>,
}

#[derive(Debug)]
pub struct GenerationReport {
    pub contract_id: String,
    pub documents: Vec<Document>,
}

/// `<contract_id>_<name>`, with path separators in either part replaced.
pub fn contract_stem(contract: &ContractRecord, worker: &WorkerRecord) -> String {
    sanitize_stem(&format!("{}_{}", contract.contract_id, worker.name))
}

pub fn nda_stem(contract: &ContractRecord, worker: &WorkerRecord) -> String {
    sanitize_stem(&format!("{}_NDA_{}", contract.contract_id, worker.name))
}

/// Runs generation against one project layout and writes through `sink`.
pub struct Generator<S> {
    layout: Layout,
    templates: TemplateStore,
    sink: S,
}

impl<S: ArtifactSink> Generator<S> {
    pub fn new(layout: Layout, sink: S) -> Self {
        let templates = TemplateStore::new(layout.templates_dir());
        Self {
            layout,
            templates,
            sink,
        }
    }

    /// Generate the contract, and the NDA when the contract requires one.
    ///
    /// Every record and template is loaded before the first write, so a
    /// missing or malformed input leaves no output behind.
    pub fn generate(&self, req: &GenerateRequest) -> Result<GenerationReport, GenerateError> {
        // 1. Load records.
        let worker_raw = load_value(&req.worker)?;
        let contract_raw = load_value(&req.contract)?;
        let company_path = req
            .company
            .clone()
            .unwrap_or_else(|| self.layout.company_path());
        let company: CompanyRecord = load_record(&company_path)?;

        // 2. Validate, when asked to.
        if req.strict {
            let worker = validate(RecordKind::Worker, &worker_raw);
            let contract = validate(RecordKind::Contract, &contract_raw);
            if !worker.is_empty() || !contract.is_empty() {
                return Err(GenerateError::Invalid { worker, contract });
            }
        }

        let worker: WorkerRecord = decode(&req.worker, worker_raw)?;
        let contract: ContractRecord = decode(&req.contract, contract_raw)?;

        // 3. Load templates.
        let body = self.templates.contract(contract.template)?;
        let nda_body = if contract.nda_required {
            Some(self.templates.nda()?)
        } else {
            None
        };

        // 4. Render and write the contract.
        let mut documents = Vec::with_capacity(2);
        let vars = derive_contract_variables(&worker, &contract, &company);
        documents.push(self.emit(
            DocumentKind::Contract,
            &contract_stem(&contract, &worker),
            &body,
            vars.into(),
        )?);

        // 5. Companion NDA.
        if let Some(nda_body) = nda_body {
            let vars = derive_nda_variables(&worker, &contract, &company);
            documents.push(self.emit(
                DocumentKind::Nda,
                &nda_stem(&contract, &worker),
                &nda_body,
                vars.into(),
            )?);
        }

        info!(
            contract_id = %contract.contract_id,
            documents = documents.len(),
            "generation complete"
        );
        Ok(GenerationReport {
            contract_id: contract.contract_id,
            documents,
        })
    }

    fn emit(
        &self,
        kind: DocumentKind,
        stem: &str,
        body: &str,
        vars: VariableMap,
    ) -> Result<Document, StoreError> {
        let rendered = render(body, &vars);
        let path = self.sink.write(stem, &rendered.text)?;
        Ok(Document {
            kind,
            path,
            unresolved: rendered.unresolved,
        })
    }
}

/// Load and validate a single record file.
pub fn validate_file(path: &Path, kind: RecordKind) -> Result<Vec<Violation>, StoreError> {
    let value = load_value(path)?;
    Ok(validate(kind, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_store::MarkdownSink;
    use serde_json::json;

    const CONTRACT_TEMPLATE: &str = "\
# 프리랜서 용역 계약서 {{contract_id}}

갑: {{company_name}} (대표 {{company_ceo}})
을: {{name}} ({{phone}})

기간: {{start_date}} ~ {{end_date}}, 장소: {{work_location}}
보수: {{payment_cycle}} {{payment_amount}}원, 세율 {{tax_rate}}%, 실수령액 {{net_amount}}원
지급: {{payment_method}} ({{bank_name}} {{account_number}} {{account_holder}})
";

    const NDA_TEMPLATE: &str = "\
# 비밀유지계약서

{{company_name}}와 {{name}}은 {{contract_date}}에 계약한다.
비밀유지 의무는 {{end_date}} 이후 {{retention_years}}년간 유지된다.
";

    struct Fixture {
        tmp: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::TempDir::new().unwrap();
            let base = tmp.path();
            std::fs::create_dir_all(base.join("templates")).unwrap();
            std::fs::create_dir_all(base.join("config")).unwrap();
            std::fs::write(
                base.join("templates/freelancer_contract.md"),
                CONTRACT_TEMPLATE,
            )
            .unwrap();
            std::fs::write(base.join("templates/nda.md"), NDA_TEMPLATE).unwrap();
            write_json(
                &base.join("config/company.json"),
                json!({
                    "company_name": "주식회사 예시",
                    "company_ceo": "홍길동",
                    "company_address": "서울특별시 중구 세종대로 110",
                    "company_registration_number": "123-45-67890",
                    "contract_defaults": {}
                }),
            );
            write_json(
                &base.join("worker.json"),
                json!({
                    "worker_id": "W2024001",
                    "name": "김철수",
                    "rrn": "900101-1234567",
                    "phone": "010-1234-5678",
                    "address": "서울특별시 강남구 테헤란로 1",
                    "type": "freelancer",
                    "tax_rate": 10,
                    "bank": {"name": "국민은행", "account": "123-456-789012", "holder": "김철수"}
                }),
            );
            let fixture = Self { tmp };
            fixture.write_contract(true);
            fixture
        }

        fn base(&self) -> &Path {
            self.tmp.path()
        }

        fn write_contract(&self, nda_required: bool) {
            write_json(
                &self.base().join("contract.json"),
                json!({
                    "contract_id": "C2024001",
                    "worker_id": "W2024001",
                    "contract_date": "2024-03-25",
                    "start_date": "2024-04-01",
                    "end_date": "2024-06-30",
                    "work_description": "웹 서비스 유지보수",
                    "template": "freelancer_contract.md",
                    "nda_required": nda_required,
                    "payment": {"total_amount": 1000000, "payment_cycle": "monthly", "tax_rate": 10}
                }),
            );
        }

        fn request(&self, strict: bool) -> GenerateRequest {
            GenerateRequest {
                worker: self.base().join("worker.json"),
                contract: self.base().join("contract.json"),
                company: None,
                strict,
            }
        }

        fn generator(&self) -> Generator<MarkdownSink> {
            let layout = Layout::new(self.base());
            let sink = MarkdownSink::new(layout.outputs_dir());
            Generator::new(layout, sink)
        }

        fn outputs(&self) -> PathBuf {
            Layout::new(self.base()).outputs_dir()
        }
    }

    fn write_json(path: &Path, value: serde_json::Value) {
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    #[test]
    fn generates_contract_and_nda() {
        let fx = Fixture::new();
        let report = fx.generator().generate(&fx.request(false)).unwrap();

        assert_eq!(report.contract_id, "C2024001");
        assert_eq!(report.documents.len(), 2);

        let contract = &report.documents[0];
        assert_eq!(contract.kind, DocumentKind::Contract);
        assert_eq!(contract.path, fx.outputs().join("C2024001_김철수.md"));
        assert!(contract.unresolved.is_empty());
        let text = std::fs::read_to_string(&contract.path).unwrap();
        assert!(text.contains("월급 1,000,000원, 세율 10%, 실수령액 900,000원"));
        assert!(text.contains("장소: 협의"));
        assert!(text.contains("지급: 계좌이체 (국민은행 123-456-789012 김철수)"));

        let nda = &report.documents[1];
        assert_eq!(nda.kind, DocumentKind::Nda);
        assert_eq!(nda.path, fx.outputs().join("C2024001_NDA_김철수.md"));
        let text = std::fs::read_to_string(&nda.path).unwrap();
        assert!(text.contains("2024-06-30 이후 3년간"));
    }

    #[test]
    fn nda_skipped_when_not_required() {
        let fx = Fixture::new();
        fx.write_contract(false);
        std::fs::remove_file(fx.base().join("templates/nda.md")).unwrap();

        let report = fx.generator().generate(&fx.request(false)).unwrap();
        assert_eq!(report.documents.len(), 1);
        assert!(!fx.outputs().join("C2024001_NDA_김철수.md").exists());
    }

    #[test]
    fn unresolved_placeholders_still_written() {
        let fx = Fixture::new();
        std::fs::write(
            fx.base().join("templates/freelancer_contract.md"),
            "{{name}} / {{witness}}",
        )
        .unwrap();

        let report = fx.generator().generate(&fx.request(false)).unwrap();
        let doc = &report.documents[0];
        assert_eq!(doc.unresolved, BTreeSet::from(["witness".to_string()]));
        assert_eq!(
            std::fs::read_to_string(&doc.path).unwrap(),
            "김철수 / {{witness}}"
        );
    }

    #[test]
    fn missing_worker_file_writes_nothing() {
        let fx = Fixture::new();
        std::fs::remove_file(fx.base().join("worker.json")).unwrap();

        let err = fx.generator().generate(&fx.request(false)).unwrap_err();
        assert!(matches!(err, GenerateError::Store(StoreError::NotFound(_))));
        assert!(!fx.outputs().exists());
    }

    #[test]
    fn malformed_contract_writes_nothing() {
        let fx = Fixture::new();
        std::fs::write(fx.base().join("contract.json"), "{ not json").unwrap();

        let err = fx.generator().generate(&fx.request(false)).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Store(StoreError::Malformed { .. })
        ));
        assert!(!fx.outputs().exists());
    }

    #[test]
    fn worker_name_cannot_escape_output_directory() {
        let fx = Fixture::new();
        let worker_path = fx.base().join("worker.json");
        let mut worker: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&worker_path).unwrap()).unwrap();
        worker["name"] = json!("x/../../escaped");
        write_json(&worker_path, worker);

        let report = fx.generator().generate(&fx.request(false)).unwrap();
        for doc in &report.documents {
            assert_eq!(doc.path.parent(), Some(fx.outputs().as_path()));
        }
        assert_eq!(
            report.documents[0].path,
            fx.outputs().join("C2024001_x_.._.._escaped.md")
        );
        assert!(!fx.base().join("escaped.md").exists());
        assert!(!fx.base().join("outputs/escaped.md").exists());
    }

    #[test]
    fn fields_absent_from_documents_do_not_block_generation() {
        let fx = Fixture::new();
        let worker_path = fx.base().join("worker.json");
        let mut worker: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&worker_path).unwrap()).unwrap();
        worker["type"] = json!("intern");
        worker.as_object_mut().unwrap().remove("tax_rate");
        write_json(&worker_path, worker);

        let report = fx.generator().generate(&fx.request(false)).unwrap();
        assert_eq!(report.documents.len(), 2);

        let err = fx.generator().generate(&fx.request(true)).unwrap_err();
        match err {
            GenerateError::Invalid { worker, contract } => {
                let fields: Vec<_> = worker.iter().map(Violation::field).collect();
                assert_eq!(fields, ["tax_rate", "type"]);
                assert!(contract.is_empty());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn missing_printed_field_is_invalid_record() {
        let fx = Fixture::new();
        let worker_path = fx.base().join("worker.json");
        let mut worker: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&worker_path).unwrap()).unwrap();
        worker.as_object_mut().unwrap().remove("name");
        write_json(&worker_path, worker);

        let err = fx.generator().generate(&fx.request(false)).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Store(StoreError::InvalidRecord { .. })
        ));
        assert!(!err.to_string().contains("malformed JSON"));
        assert!(!fx.outputs().exists());
    }

    #[test]
    fn missing_nda_template_aborts_before_contract_is_written() {
        let fx = Fixture::new();
        std::fs::remove_file(fx.base().join("templates/nda.md")).unwrap();

        let err = fx.generator().generate(&fx.request(false)).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Store(StoreError::TemplateNotFound(_))
        ));
        assert!(!fx.outputs().exists());
    }

    #[test]
    fn strict_mode_rejects_invalid_records() {
        let fx = Fixture::new();
        let worker_path = fx.base().join("worker.json");
        let mut worker: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&worker_path).unwrap()).unwrap();
        worker["phone"] = json!("010-12-34");
        write_json(&worker_path, worker);

        let err = fx.generator().generate(&fx.request(true)).unwrap_err();
        match err {
            GenerateError::Invalid { worker, contract } => {
                assert_eq!(worker.len(), 1);
                assert_eq!(worker[0].field(), "phone");
                assert!(contract.is_empty());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(!fx.outputs().exists());

        // Without strict mode the same records still generate.
        assert!(fx.generator().generate(&fx.request(false)).is_ok());
    }

    #[test]
    fn explicit_company_file_overrides_default() {
        let fx = Fixture::new();
        let company_path = fx.base().join("other_company.json");
        write_json(
            &company_path,
            json!({
                "company_name": "다른회사",
                "company_ceo": "이사장",
                "company_address": "부산광역시",
                "company_registration_number": "999-99-99999",
                "contract_defaults": {"nda_retention_years": 7}
            }),
        );
        let mut req = fx.request(false);
        req.company = Some(company_path);

        let report = fx.generator().generate(&req).unwrap();
        let text = std::fs::read_to_string(&report.documents[1].path).unwrap();
        assert!(text.contains("다른회사와 김철수은"));
        assert!(text.contains("7년간"));
    }

    #[test]
    fn validate_file_reports_violations() {
        let fx = Fixture::new();
        let violations = validate_file(&fx.base().join("worker.json"), RecordKind::Worker).unwrap();
        assert!(violations.is_empty());

        let violations =
            validate_file(&fx.base().join("worker.json"), RecordKind::Contract).unwrap();
        assert_eq!(violations.len(), 7);
    }

    #[test]
    fn shipped_templates_only_use_derived_keys() {
        use covenant_core::unresolved_placeholders;
        use covenant_core::variables::{CONTRACT_KEYS, NDA_KEYS};

        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let store = TemplateStore::new(&dir);
        for name in covenant_core::TemplateName::ALL {
            let body = store.contract(name).unwrap();
            for key in unresolved_placeholders(&body) {
                assert!(
                    CONTRACT_KEYS.contains(&key.as_str()),
                    "{} uses unknown placeholder {key}",
                    name.file_name()
                );
            }
        }
        for key in unresolved_placeholders(&store.nda().unwrap()) {
            assert!(NDA_KEYS.contains(&key.as_str()), "nda.md uses unknown placeholder {key}");
        }
    }
}
