//! Agent catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AgentError;

/// The twelve automation agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Bookkeeper,
    InboxCommander,
    HireWell,
    CustomerCare,
    SocialPilot,
    Appointment,
    ComplianceGuard,
    VendorNegotiator,
    ProposalPro,
    InventoryIq,
    ReputationShield,
    CashflowCommander,
}

/// Static catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub features: &'static [&'static str],
    pub integrations: &'static [&'static str],
    pub required_integrations: &'static [&'static str],
}

impl AgentType {
    pub const ALL: [AgentType; 12] = [
        AgentType::Bookkeeper,
        AgentType::InboxCommander,
        AgentType::HireWell,
        AgentType::CustomerCare,
        AgentType::SocialPilot,
        AgentType::Appointment,
        AgentType::ComplianceGuard,
        AgentType::VendorNegotiator,
        AgentType::ProposalPro,
        AgentType::InventoryIq,
        AgentType::ReputationShield,
        AgentType::CashflowCommander,
    ];

    /// Wire name as stored on tasks
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Bookkeeper => "bookkeeper",
            AgentType::InboxCommander => "inbox_commander",
            AgentType::HireWell => "hire_well",
            AgentType::CustomerCare => "customer_care",
            AgentType::SocialPilot => "social_pilot",
            AgentType::Appointment => "appointment",
            AgentType::ComplianceGuard => "compliance_guard",
            AgentType::VendorNegotiator => "vendor_negotiator",
            AgentType::ProposalPro => "proposal_pro",
            AgentType::InventoryIq => "inventory_iq",
            AgentType::ReputationShield => "reputation_shield",
            AgentType::CashflowCommander => "cashflow_commander",
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.info().name
    }

    pub fn info(&self) -> &'static AgentInfo {
        match self {
            AgentType::Bookkeeper => &BOOKKEEPER,
            AgentType::InboxCommander => &INBOX_COMMANDER,
            AgentType::HireWell => &HIRE_WELL,
            AgentType::CustomerCare => &CUSTOMER_CARE,
            AgentType::SocialPilot => &SOCIAL_PILOT,
            AgentType::Appointment => &APPOINTMENT,
            AgentType::ComplianceGuard => &COMPLIANCE_GUARD,
            AgentType::VendorNegotiator => &VENDOR_NEGOTIATOR,
            AgentType::ProposalPro => &PROPOSAL_PRO,
            AgentType::InventoryIq => &INVENTORY_IQ,
            AgentType::ReputationShield => &REPUTATION_SHIELD,
            AgentType::CashflowCommander => &CASHFLOW_COMMANDER,
        }
    }

    pub fn by_category(category: &str) -> Vec<AgentType> {
        Self::ALL
            .into_iter()
            .filter(|agent| agent.info().category == category)
            .collect()
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == s)
            .ok_or_else(|| AgentError::UnknownAgent(s.to_string()))
    }
}

const BOOKKEEPER: AgentInfo = AgentInfo {
    name: "BookkeeperAI",
    description: "Automates bookkeeping tasks including transaction categorization, account reconciliation, anomaly detection, and financial reporting.",
    category: "Finance",
    features: &[
        "Automatic transaction categorization",
        "Bank account reconciliation",
        "Expense anomaly detection",
        "Monthly financial reports",
        "Tax-ready categorization",
        "Multi-currency support",
    ],
    integrations: &["QuickBooks", "Xero", "Plaid"],
    required_integrations: &["quickbooks"],
};

const INBOX_COMMANDER: AgentInfo = AgentInfo {
    name: "InboxCommanderAI",
    description: "Manages your email inbox by triaging messages, drafting responses, scheduling follow-ups, and extracting action items.",
    category: "Productivity",
    features: &[
        "Smart email triage and prioritization",
        "AI-drafted responses",
        "Automatic follow-up scheduling",
        "Action item extraction",
        "Meeting request handling",
        "Unsubscribe management",
    ],
    integrations: &["Gmail", "Outlook", "Google Calendar"],
    required_integrations: &["gmail"],
};

const HIRE_WELL: AgentInfo = AgentInfo {
    name: "HireWellAI",
    description: "Streamlines hiring by screening resumes, scheduling interviews, sending status updates, and managing candidate communications.",
    category: "Human Resources",
    features: &[
        "Resume screening and ranking",
        "Automated interview scheduling",
        "Candidate status updates",
        "Reference check coordination",
        "Job posting optimization",
        "Candidate pipeline tracking",
    ],
    integrations: &["Gmail", "Google Calendar", "LinkedIn"],
    required_integrations: &["gmail", "google_calendar"],
};

const CUSTOMER_CARE: AgentInfo = AgentInfo {
    name: "CustomerCareAI",
    description: "Handles customer support by answering FAQs, resolving common issues, escalating complex cases, and tracking satisfaction.",
    category: "Support",
    features: &[
        "24/7 automated support",
        "FAQ and knowledge base responses",
        "Smart escalation routing",
        "Satisfaction tracking",
        "Multi-channel support",
        "Response templates",
    ],
    integrations: &["Zendesk", "Freshdesk", "Intercom", "Gmail"],
    required_integrations: &[],
};

const SOCIAL_PILOT: AgentInfo = AgentInfo {
    name: "SocialPilotAI",
    description: "Manages social media by creating posts, scheduling content, responding to comments, and reporting on engagement.",
    category: "Marketing",
    features: &[
        "AI content generation",
        "Multi-platform scheduling",
        "Comment response drafting",
        "Engagement analytics",
        "Hashtag optimization",
        "Best time to post suggestions",
    ],
    integrations: &["Meta", "Instagram", "LinkedIn", "Twitter"],
    required_integrations: &[],
};

const APPOINTMENT: AgentInfo = AgentInfo {
    name: "AppointmentAI",
    description: "Handles scheduling by booking appointments, sending reminders, managing rescheduling, and reducing no-shows.",
    category: "Productivity",
    features: &[
        "Natural language booking",
        "Automatic reminders",
        "Rescheduling management",
        "No-show reduction",
        "Calendar optimization",
        "Buffer time management",
    ],
    integrations: &["Google Calendar", "Calendly", "Acuity"],
    required_integrations: &["google_calendar"],
};

const COMPLIANCE_GUARD: AgentInfo = AgentInfo {
    name: "ComplianceGuardAI",
    description: "Monitors regulations, tracks compliance deadlines, audits processes, and ensures your business stays compliant with all requirements.",
    category: "Legal & Compliance",
    features: &[
        "Regulatory change monitoring",
        "Deadline tracking and alerts",
        "Compliance gap auditing",
        "Policy document generation",
        "Audit-ready reporting",
        "Industry-specific compliance",
    ],
    integrations: &["Google Workspace", "DocuSign", "Gusto"],
    required_integrations: &[],
};

const VENDOR_NEGOTIATOR: AgentInfo = AgentInfo {
    name: "VendorNegotiatorAI",
    description: "Analyzes vendor contracts, benchmarks pricing, identifies savings opportunities, and automates renewal negotiations.",
    category: "Procurement",
    features: &[
        "Contract inventory management",
        "Market rate benchmarking",
        "Savings opportunity identification",
        "Negotiation script generation",
        "Renewal automation",
        "Spend analytics",
    ],
    integrations: &["QuickBooks", "Gmail", "Bank Feeds"],
    required_integrations: &[],
};

const PROPOSAL_PRO: AgentInfo = AgentInfo {
    name: "ProposalProAI",
    description: "Generates customized proposals, responds to RFPs, prices projects intelligently, and tracks deal progress to close.",
    category: "Sales",
    features: &[
        "Custom proposal generation",
        "RFP response automation",
        "Intelligent project pricing",
        "Case study integration",
        "Follow-up automation",
        "Win/loss analysis",
    ],
    integrations: &["HubSpot", "Salesforce", "Google Docs", "DocuSign"],
    required_integrations: &[],
};

const INVENTORY_IQ: AgentInfo = AgentInfo {
    name: "InventoryIQAI",
    description: "Forecasts demand, automates reordering, optimizes stock levels, and manages multi-location inventory intelligently.",
    category: "Operations",
    features: &[
        "Demand forecasting",
        "Automated purchase orders",
        "Stock level optimization",
        "Supplier performance tracking",
        "Slow-mover identification",
        "Multi-location management",
    ],
    integrations: &["Shopify", "Square", "QuickBooks", "ShipStation"],
    required_integrations: &[],
};

const REPUTATION_SHIELD: AgentInfo = AgentInfo {
    name: "ReputationShieldAI",
    description: "Monitors online reviews, drafts responses, requests reviews from happy customers, and tracks brand sentiment.",
    category: "Marketing",
    features: &[
        "Multi-platform review monitoring",
        "AI response generation",
        "Review request campaigns",
        "Sentiment analysis",
        "Competitor tracking",
        "Crisis alert system",
    ],
    integrations: &["Google Business", "Yelp", "Facebook", "Email"],
    required_integrations: &[],
};

const CASHFLOW_COMMANDER: AgentInfo = AgentInfo {
    name: "CashFlowCommanderAI",
    description: "Projects cash flow, prioritizes collections, optimizes payment timing, and alerts you to potential cash crunches.",
    category: "Finance",
    features: &[
        "30/60/90 day cash projections",
        "Collection prioritization",
        "Payment timing optimization",
        "Cash crunch alerts",
        "Invoice reminder automation",
        "Customer payment scoring",
    ],
    integrations: &["QuickBooks", "Xero", "Bank Accounts", "Stripe"],
    required_integrations: &["quickbooks"],
};
