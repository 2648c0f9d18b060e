//! Domain Catalog: static per-domain configuration read by every screening stage.
//!
//! Skill lists are ordered and deduplicated; the order is the order `SkillMatch`
//! reports found/missing skills in.

/// Everything the pipeline knows about one target job domain.
#[derive(Debug)]
pub struct DomainProfile {
    pub key: &'static str,
    pub skills: &'static [&'static str],
    pub courses: &'static [&'static str],
    pub projects: &'static [&'static str],
}

pub const DOMAINS: &[DomainProfile] = &[
    DomainProfile {
        key: "software_engineer",
        skills: &[
            "python", "java", "c++", "c#", "oop", "dsa", "algorithms", "data structures", "git",
            "api", "rest", "sql", "debugging", "django", "flask", "spring", "dotnet", "testing",
            "system design",
        ],
        courses: &[
            "Data Structures & Algorithms mastery",
            "Clean Code + SOLID principles",
            "Object-Oriented System Design Basics",
        ],
        projects: &[
            "Build a REST API with authentication",
            "Low-level design of a feature (e.g., Library Management, Parking System)",
        ],
    },
    DomainProfile {
        key: "data_science",
        skills: &[
            "python", "numpy", "pandas", "statistics", "probability", "linear regression",
            "classification", "clustering", "machine learning", "deep learning", "nlp",
            "matplotlib", "seaborn", "scikit-learn", "tensorflow", "pytorch",
            "feature engineering", "model validation",
        ],
        courses: &[
            "Machine Learning with Scikit-Learn & TensorFlow",
            "Statistics for Data Science",
            "Data Visualization (Matplotlib / PowerBI)",
        ],
        projects: &[
            "Kaggle classification/regression model with report",
            "Mini project on sentiment analysis or recommendation system",
        ],
    },
    DomainProfile {
        key: "web_development",
        skills: &[
            "html", "css", "javascript", "bootstrap", "react", "angular", "vue", "node",
            "express", "frontend", "backend", "rest api", "ui", "ux", "responsive design",
            "tailwind", "mongodb", "mysql",
        ],
        courses: &[
            "React or Angular from scratch",
            "Backend APIs with Node/Python",
            "UI/UX fundamentals",
        ],
        projects: &[
            "Full-stack CRUD application with login",
            "Responsive animated portfolio site",
        ],
    },
    DomainProfile {
        key: "devops_cloud",
        skills: &[
            "linux", "docker", "kubernetes", "jenkins", "aws", "azure", "gcp", "terraform",
            "ci/cd", "monitoring", "networking", "cloud security", "automation", "bash",
            "gitlab ci",
        ],
        courses: &[
            "Linux + Bash scripting",
            "Docker + Kubernetes basics",
            "CI/CD pipeline fundamentals",
        ],
        projects: &[
            "Deploy an app on AWS/GCP/Azure",
            "CI/CD automation project (GitHub Actions/Jenkins)",
        ],
    },
    DomainProfile {
        key: "ui_ux_design",
        skills: &[
            "figma", "adobe xd", "wireframing", "user research", "prototyping", "ui patterns",
            "design systems", "interaction design", "accessibility", "usability testing",
        ],
        courses: &[
            "Figma / Adobe XD Masterclass",
            "Wireframing + Prototyping workflows",
            "Color theory + typography",
        ],
        projects: &[
            "Design system for a SaaS dashboard",
            "Mobile app prototype with usability testing",
        ],
    },
    DomainProfile {
        key: "product_management",
        skills: &[
            "roadmapping", "agile", "scrum", "jira", "stakeholder management", "market research",
            "requirements gathering", "prioritization", "product strategy", "wireframing",
            "metrics", "release planning",
        ],
        courses: &[
            "Agile + Scrum essentials",
            "Roadmap planning & prioritization",
            "Stakeholder communication",
        ],
        projects: &[
            "Create PRD + mockups for a new app",
            "Build product roadmap for a business problem",
        ],
    },
    DomainProfile {
        key: "cybersecurity",
        skills: &[
            "network security", "linux", "firewalls", "ethical hacking", "penetration testing",
            "siem", "incident response", "cryptography", "threat analysis", "osint",
            "vulnerability scanning",
        ],
        courses: &[
            "Ethical hacking fundamentals",
            "Network security basics",
            "OWASP Top 10",
        ],
        projects: &[
            "Vulnerability assessment report",
            "Secure API security audit mini project",
        ],
    },
    DomainProfile {
        key: "business_analyst",
        skills: &[
            "excel", "sql", "requirements gathering", "brd", "frd", "data visualization",
            "power bi", "tableau", "analysis", "uml", "documentation",
            "stakeholder communication",
        ],
        courses: &[
            "SQL fundamentals",
            "Flow diagrams + BRD writing",
            "Requirements lifecycle documentation",
        ],
        projects: &[
            "Case study: requirement analysis for an HR system",
            "Dashboard + reporting implementation",
        ],
    },
    DomainProfile {
        key: "digital_marketing",
        skills: &[
            "seo", "sem", "google ads", "meta ads", "email marketing", "analytics",
            "content writing", "branding", "keyword research", "social media marketing",
            "campaign management",
        ],
        courses: &[
            "SEO + Google Analytics",
            "Content + Social media strategy",
            "Paid campaign optimization",
        ],
        projects: &[
            "Run a real or mock campaign and analyse metrics",
            "SEO analysis + strategy report",
        ],
    },
    DomainProfile {
        key: "hr_talent_acquisition",
        skills: &[
            "recruitment", "linkedin sourcing", "screening", "interviewing", "hrms", "ats",
            "employee engagement", "onboarding", "payroll basics", "communication",
            "conflict management",
        ],
        courses: &[
            "HR communication & interviewing",
            "Screening + JD drafting",
            "Excel + ATS basics",
        ],
        projects: &[
            "Create full hiring pipeline for a role",
            "End-to-end onboarding process workflow",
        ],
    },
];

const GENERIC_COURSES: &[&str] = &["Take 1-2 structured online courses focused on this domain."];
const GENERIC_PROJECTS: &[&str] = &["Build at least one strong portfolio project in this domain."];

/// Looks up a domain by key, ignoring case and surrounding whitespace.
pub fn domain_profile(domain: &str) -> Option<&'static DomainProfile> {
    let key = domain.trim().to_ascii_lowercase();
    DOMAINS.iter().find(|d| d.key == key)
}

/// The canonical skill list for a domain; empty for unknown domains.
pub fn domain_skills(domain: &str) -> &'static [&'static str] {
    domain_profile(domain).map(|d| d.skills).unwrap_or(&[])
}

pub fn suggested_courses(domain: &str) -> &'static [&'static str] {
    domain_profile(domain).map(|d| d.courses).unwrap_or(GENERIC_COURSES)
}

pub fn suggested_projects(domain: &str) -> &'static [&'static str] {
    domain_profile(domain).map(|d| d.projects).unwrap_or(GENERIC_PROJECTS)
}

// ────────────────────────────────────────────────────────────────────────────
// Question bank
// ────────────────────────────────────────────────────────────────────────────

const QUESTION_BANK: &[(&str, &[&str])] = &[
    // software engineering
    ("python", &["Explain list vs tuple.", "What is a lambda function?", "What is list comprehension?", "Difference between shallow and deep copy?"]),
    ("java", &["What is JVM, JRE and JDK?", "Explain inheritance in Java."]),
    ("c++", &["What is polymorphism in C++?", "Explain constructor vs destructor."]),
    ("oop", &["Explain the 4 principles of OOP with examples.", "What is abstraction vs encapsulation?"]),
    ("dsa", &["What is the difference between array and linked list?", "Explain time complexity of binary search."]),
    ("git", &["What is git pull vs git fetch?", "Explain branching strategy."]),
    ("api", &["What is REST?", "Explain difference between GET and POST."]),
    ("sql", &["Explain joins.", "What is normalization?"]),
    ("django", &["What is Django ORM?", "Explain middleware in Django."]),
    ("flask", &["What is Flask routing?", "How to handle session in Flask?"]),
    // data science
    ("numpy", &["What is broadcasting in numpy?", "Difference between reshape and ravel?"]),
    ("pandas", &["Explain groupby vs apply.", "How merging works in pandas?"]),
    ("statistics", &["What is p-value?", "Explain central limit theorem."]),
    ("machine learning", &["What is overfitting?", "Explain supervised vs unsupervised learning."]),
    ("deep learning", &["What is a neural network?", "Explain activation functions."]),
    ("nlp", &["What is tokenization?", "Explain stemming vs lemmatization."]),
    ("tensorflow", &["What is a tensor?", "Explain gradient descent."]),
    ("pytorch", &["What is autograd?", "Difference between model.eval() and model.train()?"]),
    // web
    ("html", &["What is semantic HTML?", "Explain difference between div and span."]),
    ("css", &["What is flexbox?", "Difference between margin and padding?"]),
    ("javascript", &["What is hoisting?", "Explain promises."]),
    ("react", &["How does React state work?", "What is virtual DOM?"]),
    ("node", &["What is event loop?", "Explain middleware concept."]),
    ("frontend", &["What is responsive design?", "Explain accessibility basics."]),
    ("backend", &["What is MVC?", "Explain authentication vs authorization."]),
    // devops / cloud
    ("linux", &["What is chmod?", "Explain process vs thread in Linux."]),
    ("docker", &["What is containerization?", "Explain Dockerfile layers."]),
    ("kubernetes", &["What is a pod?", "Explain deployment vs service."]),
    ("aws", &["What is EC2?", "Explain S3 bucket lifecycle."]),
    ("azure", &["Explain Azure App Service.", "What is Azure VM scale set?"]),
    ("terraform", &["What is IAC (Infrastructure as Code)?", "Explain Terraform state files."]),
    // ui/ux
    ("figma", &["What is auto-layout in Figma?", "How do components and variants work?"]),
    ("wireframing", &["What is low-fidelity vs high-fidelity design?", "Purpose of user personas?"]),
    ("ux", &["What is usability testing?", "Explain UI vs UX."]),
    // product
    ("agile", &["Explain Scrum vs Kanban.", "What is sprint planning?"]),
    ("requirements gathering", &["What is BRD vs FRD?", "Explain user stories."]),
    ("metrics", &["What are KPIs?", "What is product-market fit?"]),
    // security
    ("network security", &["What is firewall?", "Explain phishing attack."]),
    ("ethical hacking", &["Difference between black box vs white box testing?", "Explain OWASP top 10."]),
    ("siem", &["What is SIEM?", "Explain incident logging."]),
    // business analysis
    ("excel", &["What are pivot tables?", "Explain VLOOKUP vs INDEX/MATCH."]),
    ("power bi", &["What is DAX?", "Explain page filters vs report filters."]),
    ("tableau", &["What is calculated field?", "Explain dashboards vs worksheets."]),
    // marketing
    ("seo", &["What is on-page SEO?", "Explain keyword density."]),
    ("google ads", &["Explain CPC vs CPM.", "How does Quality Score work?"]),
    ("social media marketing", &["What is engagement rate?", "Difference between organic vs paid reach?"]),
    // hr
    ("recruitment", &["Explain end-to-end recruitment lifecycle.", "What is competency-based interviewing?"]),
    ("ats", &["What is Applicant Tracking System?", "How do resume scoring algorithms work?"]),
    ("onboarding", &["Explain employee onboarding process.", "Difference between HRBP vs Recruiter?"]),
];

/// Bank questions for a single skill; empty when the bank has no entry.
pub fn bank_questions(skill: &str) -> &'static [&'static str] {
    let key = skill.trim().to_ascii_lowercase();
    QUESTION_BANK
        .iter()
        .find(|(s, _)| *s == key)
        .map(|(_, qs)| *qs)
        .unwrap_or(&[])
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback interview content
// ────────────────────────────────────────────────────────────────────────────

const DATA_FALLBACK: &[&str] = &[
    "Explain one data project from your resume in detail.",
    "How did you handle missing values in your dataset?",
    "Which evaluation metric did you use and why?",
    "Describe a time when your model did not work as expected.",
    "How do you decide which features are important?",
];

const WEB_FALLBACK: &[&str] = &[
    "Walk me through one web app you built.",
    "How did you handle authentication and authorization?",
    "What performance optimisations did you implement?",
    "Explain a layout or responsiveness issue you solved.",
    "How did you connect frontend and backend?",
];

const SOFTWARE_FALLBACK: &[&str] = &[
    "Describe the architecture of one software project you worked on.",
    "How did you manage version control and branching?",
    "Explain a bug that was hard to debug and how you fixed it.",
    "How do you ensure code quality in your projects?",
    "What design patterns have you used?",
];

const GENERIC_FALLBACK: &[&str] = &[
    "Tell me about one project from your resume in detail.",
    "Which skill from your resume do you want to improve first, and why?",
    "Describe a situation where you faced a difficult technical challenge.",
    "How do you usually learn a new technology?",
    "Tell me about a time you worked in a team.",
];

/// Tips used whenever generated improvements are unavailable.
pub const FALLBACK_IMPROVEMENTS: &[&str] = &[
    "Add more measurable impact to your project descriptions.",
    "Include links to GitHub or live demos wherever possible.",
    "Focus on strengthening 1-2 core skills instead of many shallow ones.",
];

/// Deterministic interview questions keyed by substring of the domain string.
/// Total: any input, including empty, yields a five-question list.
pub fn fallback_questions(domain: &str) -> &'static [&'static str] {
    let domain = domain.to_lowercase();
    if domain.contains("data") {
        DATA_FALLBACK
    } else if domain.contains("web") {
        WEB_FALLBACK
    } else if domain.contains("software") {
        SOFTWARE_FALLBACK
    } else {
        GENERIC_FALLBACK
    }
}
