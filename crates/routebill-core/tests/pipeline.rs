use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use routebill_core::error::{RenderError, SchemaError};
use routebill_core::{
    BillingConfig, BillingError, DocumentSource, InvoiceDocument, InvoiceRenderer, LedgerStore,
    Pipeline, RunOutcome, TemplateRenderer, discover_documents,
};

const HEADER: &str = "date,total stops,week of year,converted hours,invoice.nr,invoiced\n";
const TEMPLATE: &str = "Invoice,${invoiceNumber}\n\
                        Week,Hours,Price,Total\n\
                        ${table:records.weekOfYear},${table:records.hours},${table:records.price},${table:records.total}\n";

/// Reads "documents" that are plain text files.
struct TextSource;

impl DocumentSource for TextSource {
    fn read_text(&self, path: &Path) -> routebill_core::Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

struct FailingRenderer;

impl InvoiceRenderer for FailingRenderer {
    fn render(&self, _invoice: &InvoiceDocument, _output_dir: &Path) -> routebill_core::Result<PathBuf> {
        Err(RenderError::Conversion("printer on fire".to_string()).into())
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new(ledger: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("reports")).unwrap();
        std::fs::write(root.join("ledger.csv"), ledger).unwrap();
        std::fs::write(root.join("template.csv"), TEMPLATE).unwrap();
        Self { _dir: dir, root }
    }

    fn report(&self, name: &str, date: &str, stops: u32) {
        let text = format!(
            "Activiteitenrapport {date}\nChauffeur: J. Jansen\nTotaal aantal succesvolle stops {stops}\n"
        );
        std::fs::write(self.root.join("reports").join(name), text).unwrap();
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger.csv")
    }

    fn ledger_text(&self) -> String {
        std::fs::read_to_string(self.ledger_path()).unwrap()
    }

    fn output_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    fn pipeline(&self) -> Pipeline {
        let config = BillingConfig::default();
        let renderer = TemplateRenderer::from_config(self.root.join("template.csv"), &config);
        self.pipeline_with(Box::new(renderer))
    }

    fn pipeline_with(&self, renderer: Box<dyn InvoiceRenderer>) -> Pipeline {
        Pipeline::new(
            BillingConfig::default(),
            LedgerStore::new(self.ledger_path()),
            Arc::new(TextSource),
            renderer,
            self.output_dir(),
        )
        .unwrap()
    }

    fn documents(&self) -> Vec<PathBuf> {
        discover_documents(&self.root.join("reports")).unwrap()
    }
}

#[tokio::test]
async fn test_full_run_bills_new_rows() {
    let ws = Workspace::new(&format!("{HEADER}29-01-2024,140,5,4,INVOICE #041,true\n"));
    ws.report("a.pdf", "05-02-2024", 142);
    ws.report("b.pdf", "12-02-2024", 70);
    ws.report("a-copy.pdf", "05-02-2024", 142);

    let outcome = ws.pipeline().run(&ws.documents()).await.unwrap();

    let RunOutcome::Invoiced(run) = outcome else {
        panic!("expected an invoice");
    };
    assert_eq!(run.invoice_ref, "INVOICE #042");
    assert_eq!(run.appended, 2);
    assert_eq!(run.records.len(), 2);
    assert_eq!(run.records[0].week_of_year, 6);
    assert_eq!(run.artifact, ws.output_dir().join("MTNA_invoice INVOICE #042.csv"));
    assert!(run.artifact.is_file());

    assert_eq!(
        ws.ledger_text(),
        format!(
            "{HEADER}29-01-2024,140,5,4,INVOICE #041,true\n\
             05-02-2024,142,6,4.06,INVOICE #042,true\n\
             12-02-2024,70,7,2,INVOICE #042,true\n"
        )
    );
}

#[tokio::test]
async fn test_rerun_with_same_documents_bills_nothing() {
    let ws = Workspace::new(HEADER);
    ws.report("a.pdf", "05-02-2024", 142);

    let first = ws.pipeline().run(&ws.documents()).await.unwrap();
    assert!(matches!(first, RunOutcome::Invoiced(ref run) if run.invoice_ref == "INVOICE #040"));
    let ledger_after_first = ws.ledger_text();

    let second = ws.pipeline().run(&ws.documents()).await.unwrap();

    assert_eq!(second, RunOutcome::NothingToBill);
    assert_eq!(ws.ledger_text(), ledger_after_first);
    let artifacts = std::fs::read_dir(ws.output_dir()).unwrap().count();
    assert_eq!(artifacts, 1);
}

#[tokio::test]
async fn test_no_documents_and_no_unbilled_rows() {
    let ws = Workspace::new(HEADER);

    let outcome = ws.pipeline().run(&ws.documents()).await.unwrap();

    assert_eq!(outcome, RunOutcome::NothingToBill);
    assert!(!ws.output_dir().exists());
}

#[tokio::test]
async fn test_malformed_report_leaves_ledger_unchanged() {
    let ledger = format!("{HEADER}29-01-2024,140,5,4,INVOICE #041,true\n");
    let ws = Workspace::new(&ledger);
    ws.report("good.pdf", "05-02-2024", 142);
    std::fs::write(
        ws.root.join("reports").join("bad.pdf"),
        "Activiteitenrapport 06-02-2024\nno stop count on this page\n",
    )
    .unwrap();

    let err = ws.pipeline().run(&ws.documents()).await.unwrap_err();

    assert!(matches!(err, BillingError::Extraction(_)));
    assert!(err.to_string().contains("bad.pdf"));
    assert_eq!(ws.ledger_text(), ledger);
    assert!(!ws.output_dir().exists());
}

#[tokio::test]
async fn test_render_failure_keeps_rows_unbilled_and_number_unused() {
    let ws = Workspace::new(&format!("{HEADER}29-01-2024,140,5,4,INVOICE #041,true\n"));
    ws.report("a.pdf", "05-02-2024", 142);

    let err = ws
        .pipeline_with(Box::new(FailingRenderer))
        .run(&ws.documents())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Render(_)));

    // Row was merged, but carries no invoice number and is not billed.
    assert_eq!(
        ws.ledger_text(),
        format!(
            "{HEADER}29-01-2024,140,5,4,INVOICE #041,true\n\
             05-02-2024,142,6,4.06,,\n"
        )
    );

    let outcome = ws.pipeline().run(&ws.documents()).await.unwrap();
    let RunOutcome::Invoiced(run) = outcome else {
        panic!("expected an invoice");
    };
    assert_eq!(run.invoice_ref, "INVOICE #042");
    assert_eq!(run.appended, 0);
}

#[tokio::test]
async fn test_admin_deduction_on_first_week() {
    let ws = Workspace::new(HEADER);
    // ISO weeks 1 and 2 of 2024
    ws.report("w1.pdf", "03-01-2024", 350);
    ws.report("w2.pdf", "10-01-2024", 350);

    let outcome = ws.pipeline().run(&ws.documents()).await.unwrap();

    let RunOutcome::Invoiced(run) = outcome else {
        panic!("expected an invoice");
    };
    let hours: Vec<Decimal> = run.records.iter().map(|r| r.hours).collect();
    assert_eq!(hours, vec![Decimal::new(409, 2), Decimal::new(10, 0)]);
    assert_eq!(run.records[0].total, Decimal::new(2075675, 4));
    assert_eq!(run.records[1].total, Decimal::new(5075, 1));

    let artifact = std::fs::read_to_string(&run.artifact).unwrap();
    assert_eq!(
        artifact,
        "Invoice,INVOICE #040\nWeek,Hours,Price,Total\n1,4.09,35,207.57\n2,10.00,35,507.50\n"
    );
}

#[tokio::test]
async fn test_billed_rows_never_reappear() {
    let ws = Workspace::new(HEADER);
    ws.report("a.pdf", "05-02-2024", 142);
    ws.pipeline().run(&ws.documents()).await.unwrap();

    ws.report("b.pdf", "13-02-2024", 35);
    let outcome = ws.pipeline().run(&ws.documents()).await.unwrap();

    let RunOutcome::Invoiced(run) = outcome else {
        panic!("expected an invoice");
    };
    assert_eq!(run.invoice_ref, "INVOICE #041");
    assert_eq!(run.billed_dates.len(), 1);
    let unbilled = LedgerStore::new(ws.ledger_path()).read_unbilled().unwrap();
    assert!(unbilled.is_empty());
}

#[tokio::test]
async fn test_template_without_records_row_leaves_ledger_unchanged() {
    let ws = Workspace::new(HEADER);
    ws.report("a.pdf", "05-02-2024", 142);
    let template = ws.root.join("no-records.csv");
    std::fs::write(&template, "Invoice,${invoiceNumber}\nTotal,\n").unwrap();
    let renderer = TemplateRenderer::from_config(&template, &BillingConfig::default());

    let err = ws
        .pipeline_with(Box::new(renderer))
        .run(&ws.documents())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BillingError::Schema(SchemaError::MissingColumn { column: "records", .. })
    ));
    assert_eq!(ws.ledger_text(), HEADER);
    assert!(!ws.output_dir().exists());
}

#[tokio::test]
async fn test_oversized_invoice_number_aborts_before_any_write() {
    let ledger = format!("{HEADER}29-01-2024,140,5,4,INVOICE #99999999999999999999,true\n");
    let ws = Workspace::new(&ledger);
    ws.report("a.pdf", "05-02-2024", 142);

    let err = ws.pipeline().run(&ws.documents()).await.unwrap_err();

    assert!(matches!(err, BillingError::Schema(SchemaError::InvoiceRef { .. })));
    assert_eq!(ws.ledger_text(), ledger);
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let ws = Workspace::new(HEADER);
    let mut config = BillingConfig::default();
    config.numbering.invoice_number_format = "no placeholder".to_string();

    let result = Pipeline::new(
        config,
        LedgerStore::new(ws.ledger_path()),
        Arc::new(TextSource),
        Box::new(FailingRenderer),
        ws.output_dir(),
    );

    assert!(matches!(result, Err(BillingError::Config(_))));
}
